//! Final image encoding
//!
//! Every written asset is a PNG of exactly the declared size. Provider output
//! is cover-fitted (scaled to fill, centre-cropped); a missing image becomes a
//! grey placeholder with a caption.

use crate::caption::draw_caption;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use mystery_core::{MysteryError, Result};
use std::io::Cursor;
use std::path::Path;

const PLACEHOLDER_BG: Rgba<u8> = Rgba([100, 100, 100, 255]);
const CAPTION_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CAPTION_MAX_CHARS: usize = 30;

/// Produce the PNG bytes for an asset of `width` x `height`.
///
/// With `source == None` a placeholder is synthesised, captioned with the
/// first characters of `caption`.
pub fn encode_output(source: Option<&[u8]>, width: u32, height: u32, caption: &str) -> Result<Vec<u8>> {
    let img = match source {
        Some(bytes) => decode(bytes)?.resize_to_fill(width, height, FilterType::Lanczos3),
        None => DynamicImage::ImageRgba8(placeholder(width, height, caption)),
    };
    encode_png(&img)
}

/// Decode image bytes in any format the `image` crate recognises
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| MysteryError::Image(format!("Failed to decode image: {}", e)))
}

/// Encode an image as PNG
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| MysteryError::Image(format!("Failed to encode PNG: {}", e)))?;
    Ok(out.into_inner())
}

/// Read the pixel dimensions of an image file without decoding it fully
pub fn image_dimensions(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| {
        MysteryError::Image(format!("Failed to read {}: {}", path.display(), e))
    })
}

fn placeholder(width: u32, height: u32, caption: &str) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(width, height, PLACEHOLDER_BG);
    let text: String = caption.chars().take(CAPTION_MAX_CHARS).collect();
    draw_caption(&mut img, &text, CAPTION_COLOR);
    img
}
