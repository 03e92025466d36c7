//! PNG encoding and background image decoding.

use crate::compositor::{ExportError, ExportResult};
use image::RgbaImage;
use thiserror::Error;

/// A fetched background could not be decoded.
#[derive(Debug, Error)]
#[error("Unsupported or corrupt image: {0}")]
pub struct DecodeError(String);

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(format!("Failed to write PNG header: {}", e)))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| ExportError::Encode(format!("Failed to write PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| ExportError::Encode(format!("Failed to finish PNG: {}", e)))?;
    }

    Ok(png_data)
}

/// Decode PNG, JPEG or WebP bytes into an RGBA buffer.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|e| DecodeError(e.to_string()))
}
