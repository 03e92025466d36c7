//! Encoded raster payload handed to a persistence sink.

/// MIME type of every exported raster.
pub const PNG_MIME: &str = "image/png";

/// A flattened, PNG-encoded image ready to be persisted.
///
/// Produced fresh for every save and consumed by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBlob {
    pub width: u32,
    pub height: u32,
    /// PNG bytes.
    pub bytes: Vec<u8>,
}

impl RasterBlob {
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self { width, height, bytes }
    }

    pub fn mime_type(&self) -> &'static str {
        PNG_MIME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name a document called `name` is persisted under.
    pub fn file_name(name: &str) -> String {
        format!("{}.png", name)
    }
}
