//! Shared plumbing for talking to the document-collection API, directly or
//! through a host proxy.

use crate::raster::RasterBlob;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use url::Url;

/// Root of the headless delivery API on the portal.
pub const API_ROOT: &str = "/o/headless-delivery/v1.0";

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Proxy error: {0}")]
    Proxy(String),
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Parse(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Parse(e.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future for async operations.
///
/// No `Send` bound: everything runs on the single UI thread.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Address of one site's document collection.
///
/// With a base URL, every path resolves to an absolute URL. Without one, paths
/// are left relative for a host proxy to resolve against its own origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Option<Url>,
    group_id: String,
}

impl Endpoint {
    /// Endpoint on the portal at `base_url`.
    pub fn remote(base_url: &str, group_id: impl Into<String>) -> TransportResult<Self> {
        let base = Url::parse(base_url).map_err(|_| TransportError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            base: Some(base),
            group_id: group_id.into(),
        })
    }

    /// Endpoint whose URLs stay relative to the host page.
    pub fn relative(group_id: impl Into<String>) -> Self {
        Self {
            base: None,
            group_id: group_id.into(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// `GET`/`POST` target for the site's documents.
    pub fn documents_url(&self) -> String {
        self.resolve(&format!("{}/sites/{}/documents", API_ROOT, self.group_id))
    }

    /// Resolve `href` (absolute or root-relative) against the base URL.
    pub fn resolve(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(href)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

/// The multipart upload body: a single `file` part holding the PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadForm {
    /// Multipart field the API reads the document from.
    pub const FIELD: &'static str = "file";

    /// Wrap a raster as `<name>.png`.
    pub fn for_raster(name: &str, raster: RasterBlob) -> Self {
        Self {
            file_name: RasterBlob::file_name(name),
            content_type: raster.mime_type().to_string(),
            bytes: raster.bytes,
        }
    }

    /// Build the `reqwest` multipart form.
    pub fn into_multipart(self) -> TransportResult<reqwest::multipart::Form> {
        let part = reqwest::multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?;
        Ok(reqwest::multipart::Form::new().part(Self::FIELD, part))
    }
}
