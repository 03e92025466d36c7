//! Persistence sinks: where a finished raster goes.
//!
//! Every deployment picks exactly one sink when the controller is built:
//! direct upload to the document collection, upload relayed through the host
//! page, or a local download. All of them report back a [`SaveOutcome`]; a
//! sink never fails silently and never returns an error to its caller.

mod download;
mod memory;
mod proxy;
mod remote;

pub use download::LocalDownload;
pub use memory::MemorySink;
pub use proxy::RemoteProxyUpload;
pub use remote::RemoteCollectionUpload;

use crate::raster::RasterBlob;
use crate::transport::BoxFuture;
use serde::{Deserialize, Serialize};

/// Message shown after a successful upload.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Hurrah! Your image was uploaded";

const DEFAULT_CONFLICT_MESSAGE: &str = "A document with this name already exists";

/// Result of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SaveOutcome {
    Success,
    /// The server already has a document with this name.
    Conflict(String),
    /// Transport, server or I/O failure.
    Error(String),
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Success)
    }
}

/// Destination for a finished raster.
pub trait PersistenceSink {
    /// Persist `raster` as `<name>.png`.
    ///
    /// The caller guarantees at most one outstanding commit.
    fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome>;

    /// Message to show the user after a successful commit of `name`.
    fn success_message(&self, _name: &str) -> String {
        UPLOAD_SUCCESS_MESSAGE.to_string()
    }
}

/// Body the collection API answers an upload with. Only the fields needed to
/// detect a conflict are read.
#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
}

impl UploadReply {
    fn is_conflict(&self) -> bool {
        match &self.status {
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("CONFLICT"),
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(409),
            _ => false,
        }
    }
}

/// Map an upload response to an outcome.
///
/// The body is read whatever the HTTP status, because conflicts come back as a
/// 409 with a JSON problem body.
pub(crate) fn interpret_upload_reply(status: u16, body: &[u8]) -> SaveOutcome {
    let reply: UploadReply = match serde_json::from_slice(body) {
        Ok(reply) => reply,
        Err(e) => {
            log::error!("Unreadable upload response (HTTP {}): {}", status, e);
            return SaveOutcome::Error(format!("Unreadable response (HTTP {}): {}", status, e));
        }
    };

    if reply.is_conflict() {
        return SaveOutcome::Conflict(reply.title.unwrap_or_else(|| DEFAULT_CONFLICT_MESSAGE.to_string()));
    }

    if (200..300).contains(&status) {
        SaveOutcome::Success
    } else {
        SaveOutcome::Error(reply.title.unwrap_or_else(|| format!("HTTP {}", status)))
    }
}
