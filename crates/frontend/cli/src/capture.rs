//! PNG screenshots and frame digests.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use fami_core::types::Frame;
use sha2::{Digest, Sha256};

/// Write `frame` (0xAARRGGBB pixels) as an 8-bit RGBA PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba_bytes(frame))?;
    Ok(())
}

fn rgba_bytes(frame: &Frame) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(frame.pixels.len() * 4);
    for &pixel in &frame.pixels {
        rgba.extend_from_slice(&[
            (pixel >> 16) as u8,
            (pixel >> 8) as u8,
            pixel as u8,
            0xFF,
        ]);
    }
    rgba
}

/// Lowercase hex SHA-256 of the frame's pixel bytes.
pub fn frame_digest(frame: &Frame) -> String {
    let mut hasher = Sha256::new();
    hasher.update(frame.to_bytes());
    format!("{:x}", hasher.finalize())
}
