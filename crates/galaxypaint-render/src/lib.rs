//! Galaxy Paint Render Library
//!
//! Flattens the drawing surface's layers into a single PNG, and decodes
//! background images fetched from the document collection.

mod codec;
mod compositor;

pub use codec::{DecodeError, decode_image, encode_png};
pub use compositor::{CompositingExporter, ExportError, ExportResult};
