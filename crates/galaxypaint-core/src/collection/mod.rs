//! Document collection: where background images are listed and fetched from.

mod proxied;
mod remote;

#[cfg(not(target_arch = "wasm32"))]
mod directory;

pub use proxied::ProxyCollectionClient;
pub use remote::CollectionClient;

#[cfg(not(target_arch = "wasm32"))]
pub use directory::DirectorySource;

use crate::transport::{BoxFuture, TransportResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder value of the image picker; selecting it does nothing.
pub const CHOOSE_PLACEHOLDER: &str = "choose";

/// A document in the site's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    pub title: String,
    /// Where the binary content can be downloaded from.
    pub content_url: String,
}

impl DocumentEntry {
    /// Name suggested when saving a drawing made over this document.
    pub fn revision_name(&self) -> String {
        format!("{}-rev", self.title)
    }
}

/// One page of the documents listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPage {
    #[serde(default)]
    pub items: Vec<DocumentEntry>,
}

/// A source of background documents.
pub trait DocumentSource {
    /// List the available documents.
    fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>>;

    /// Download a document's binary content.
    fn fetch_content(&self, entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>>;
}

fn id_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
