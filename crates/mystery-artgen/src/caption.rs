//! Tiny bitmap font for placeholder captions

use image::{Rgba, RgbaImage};

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const ADVANCE: u32 = GLYPH_W + 1;
const MAX_SCALE: u32 = 3;

/// Draw `text` centred on `img`, upper-cased.
///
/// The text is scaled down to fit the canvas width and cut off when even
/// scale 1 is too wide. Characters without a glyph render as blanks.
pub fn draw_caption(img: &mut RgbaImage, text: &str, color: Rgba<u8>) {
    let chars: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
    if chars.is_empty() {
        return;
    }

    let (width, height) = img.dimensions();
    let text_w = |n: usize, scale: u32| (n as u32 * ADVANCE).saturating_sub(1) * scale;

    let mut scale = MAX_SCALE;
    while scale > 1 && (text_w(chars.len(), scale) > width || GLYPH_H * scale > height) {
        scale -= 1;
    }
    let fit = ((width + scale) / (ADVANCE * scale)) as usize;
    let chars = &chars[..chars.len().min(fit)];

    let x0 = width.saturating_sub(text_w(chars.len(), scale)) / 2;
    let y0 = height.saturating_sub(GLYPH_H * scale) / 2;

    for (i, c) in chars.iter().enumerate() {
        let Some(rows) = glyph(*c) else { continue };
        let gx = x0 + i as u32 * ADVANCE * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = gx + col * scale + dx;
                        let y = y0 + row as u32 * scale + dy;
                        if x < width && y < height {
                            img.put_pixel(x, y, color);
                        }
                    }
                }
            }
        }
    }
}

fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '_' => [0, 0, 0, 0, 0, 0, 0b11111],
        '.' => [0, 0, 0, 0, 0, 0b01100, 0b01100],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba<u8> = Rgba([100, 100, 100, 255]);
    const FG: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn lit(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| **p == FG).count()
    }

    #[test]
    fn test_caption_draws_pixels_centered() {
        let mut img = RgbaImage::from_pixel(200, 100, BG);
        draw_caption(&mut img, "knife", FG);
        assert!(lit(&img) > 0);
        // Corners stay background
        assert_eq!(*img.get_pixel(0, 0), BG);
        assert_eq!(*img.get_pixel(199, 99), BG);
    }

    #[test]
    fn test_caption_is_case_insensitive() {
        let mut lower = RgbaImage::from_pixel(120, 40, BG);
        let mut upper = RgbaImage::from_pixel(120, 40, BG);
        draw_caption(&mut lower, "hall", FG);
        draw_caption(&mut upper, "HALL", FG);
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_caption_fits_tiny_canvas() {
        let mut img = RgbaImage::from_pixel(8, 8, BG);
        draw_caption(&mut img, "a very long caption", FG);
        assert!(lit(&img) > 0);
    }

    #[test]
    fn test_unknown_glyphs_are_blank() {
        let mut img = RgbaImage::from_pixel(64, 32, BG);
        draw_caption(&mut img, "???", FG);
        assert_eq!(lit(&img), 0);
    }
}
