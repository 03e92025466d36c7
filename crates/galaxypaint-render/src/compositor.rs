//! Flattening the background and drawing layers into one raster.

use crate::codec::encode_png;
use galaxypaint_core::raster::RasterBlob;
use galaxypaint_core::surface::DrawingSurface;
use image::RgbaImage;
use image::imageops;
use thiserror::Error;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Drawing surface has no pixels ({width}x{height})")]
    InvalidSurface { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Stacks `[background, drawing]` and encodes the result as PNG.
///
/// The output always has the drawing layer's dimensions. A larger background
/// is clipped and a smaller one leaves the uncovered area transparent. The
/// grid is never an input here.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositingExporter;

impl CompositingExporter {
    pub fn new() -> Self {
        Self
    }

    /// Flatten the layers without encoding.
    pub fn composite(&self, drawing: &RgbaImage, background: Option<&RgbaImage>) -> ExportResult<RgbaImage> {
        let (width, height) = drawing.dimensions();
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidSurface { width, height });
        }

        let mut out = RgbaImage::new(width, height);
        if let Some(background) = background {
            imageops::overlay(&mut out, background, 0, 0);
        }
        // Source-over: transparent drawing pixels leave the background visible.
        imageops::overlay(&mut out, drawing, 0, 0);
        Ok(out)
    }

    /// Flatten and encode the layers.
    pub fn export(&self, drawing: &RgbaImage, background: Option<&RgbaImage>) -> ExportResult<RasterBlob> {
        let flattened = self.composite(drawing, background)?;
        let (width, height) = flattened.dimensions();
        let bytes = encode_png(flattened.as_raw(), width, height)?;
        log::debug!("Exported {}x{} raster ({} bytes)", width, height, bytes.len());
        Ok(RasterBlob::new(width, height, bytes))
    }

    /// Export the surface's current state.
    pub fn export_surface<S: DrawingSurface + ?Sized>(&self, surface: &S) -> ExportResult<RasterBlob> {
        self.export(surface.drawing_layer(), surface.background_layer())
    }
}
