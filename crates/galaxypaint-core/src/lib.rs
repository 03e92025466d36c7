//! Galaxy Paint Core Library
//!
//! Platform-agnostic data structures for the Galaxy Paint drawing widget:
//! brush state, the drawing surface, the document collection client and the
//! persistence sinks a finished raster is committed through.

pub mod brush;
pub mod collection;
pub mod host;
pub mod raster;
pub mod sink;
pub mod stroke;
pub mod surface;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use brush::{BrushColor, ColorParseError};
pub use collection::{DocumentEntry, DocumentSource};
pub use host::{HttpRelay, ProxyRequest, ProxyResponse, RequestMethod, RequestProxy, SITE_GROUP_ID_KEY};
pub use raster::RasterBlob;
pub use sink::{LocalDownload, MemorySink, PersistenceSink, RemoteCollectionUpload, RemoteProxyUpload, SaveOutcome};
pub use stroke::Stroke;
pub use surface::{DrawingSurface, PixelSurface, DEFAULT_BRUSH_RADIUS, DEFAULT_CANVAS_SIZE, GRID_SIZE};
pub use transport::{BoxFuture, Endpoint, TransportError, TransportResult, UploadForm};
