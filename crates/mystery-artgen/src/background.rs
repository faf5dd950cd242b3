//! Background removal for cut-out assets
//!
//! Clues and characters are generated on a flat dark backdrop. The remover
//! keys that backdrop out by flood-filling inward from the image border, so
//! only background connected to the edge becomes transparent.

use crate::config::BackgroundConfig;
use crate::render::{decode, encode_png};
use image::{DynamicImage, Rgba, RgbaImage};
use mystery_core::{MysteryError, Result};

/// Trait implemented by background removal services
pub trait BackgroundRemover: Send {
    /// Return PNG bytes of `image` with the background made transparent
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>>;
}

/// Border-seeded chroma key
#[derive(Debug, Clone, Copy)]
pub struct ChromaKeyRemover {
    /// Max channel distance from the backdrop that is fully transparent
    pub tolerance: u8,
    /// Width of the soft edge above `tolerance`
    pub feather: u8,
}

impl Default for ChromaKeyRemover {
    fn default() -> Self {
        Self::from_config(&BackgroundConfig::default())
    }
}

impl ChromaKeyRemover {
    pub fn from_config(config: &BackgroundConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            feather: config.feather,
        }
    }

    fn alpha_scale(&self, distance: u32) -> u32 {
        let tolerance = self.tolerance as u32;
        if distance <= tolerance {
            return 0;
        }
        let feather = self.feather as u32;
        if feather == 0 {
            return 255;
        }
        ((distance - tolerance) * 255 / feather).min(255)
    }

    fn key_out(&self, img: &mut RgbaImage) {
        let (w, h) = img.dimensions();
        let key = border_median(img);
        let limit = self.tolerance as u32 + self.feather as u32;
        let idx = |x: u32, y: u32| (y * w + x) as usize;

        let mut visited = vec![false; (w * h) as usize];
        let mut stack = Vec::new();
        for (x, y) in border_coords(w, h) {
            if !visited[idx(x, y)] && distance(img.get_pixel(x, y), &key) <= limit {
                visited[idx(x, y)] = true;
                stack.push((x, y));
            }
        }

        while let Some((x, y)) = stack.pop() {
            let pixel = img.get_pixel_mut(x, y);
            let scale = self.alpha_scale(distance(pixel, &key));
            pixel[3] = (pixel[3] as u32 * scale / 255) as u8;

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= w || ny >= h || visited[idx(nx, ny)] {
                    continue;
                }
                if distance(img.get_pixel(nx, ny), &key) <= limit {
                    visited[idx(nx, ny)] = true;
                    stack.push((nx, ny));
                }
            }
        }
    }
}

impl BackgroundRemover for ChromaKeyRemover {
    fn remove(&self, image: &[u8]) -> Result<Vec<u8>> {
        let mut img = decode(image)
            .map_err(|e| MysteryError::BackgroundRemoval(e.to_string()))?
            .to_rgba8();
        if img.width() == 0 || img.height() == 0 {
            return Err(MysteryError::BackgroundRemoval("Empty image".to_string()));
        }
        self.key_out(&mut img);
        encode_png(&DynamicImage::ImageRgba8(img))
            .map_err(|e| MysteryError::BackgroundRemoval(e.to_string()))
    }
}

/// Largest per-channel difference, ignoring alpha
fn distance(a: &Rgba<u8>, b: &[u8; 3]) -> u32 {
    (0..3)
        .map(|c| (a[c] as i32 - b[c] as i32).unsigned_abs())
        .max()
        .unwrap_or(0)
}

/// Per-channel median of the edge pixels
fn border_median(img: &RgbaImage) -> [u8; 3] {
    let (w, h) = img.dimensions();
    let mut channels: [Vec<u8>; 3] = Default::default();
    for (x, y) in border_coords(w, h) {
        let p = img.get_pixel(x, y);
        for (c, values) in channels.iter_mut().enumerate() {
            values.push(p[c]);
        }
    }
    let mut key = [0u8; 3];
    for (c, values) in channels.iter_mut().enumerate() {
        values.sort_unstable();
        key[c] = values.get(values.len() / 2).copied().unwrap_or(0);
    }
    key
}

fn border_coords(w: u32, h: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..w).flat_map(move |x| [(x, 0), (x, h - 1)]);
    let sides = (1..h.saturating_sub(1)).flat_map(move |y| [(0, y), (w - 1, y)]);
    top_bottom.chain(sides)
}
