//! Local directory of images, for the standalone build without a portal.

use super::{DocumentEntry, DocumentSource};
use crate::transport::{BoxFuture, TransportError, TransportResult};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Lists image files in a directory as documents.
///
/// The id is the file name, the title the file stem and the content URL the
/// file path.
pub struct DirectorySource {
    base_path: PathBuf,
}

impl DirectorySource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl DocumentSource for DirectorySource {
    fn list(&self) -> BoxFuture<'_, TransportResult<Vec<DocumentEntry>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path).map_err(|e| {
                TransportError::Io(format!("Failed to read {}: {}", self.base_path.display(), e))
            })?;

            let mut documents = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() || !is_image(&path) {
                    continue;
                }
                let (Some(file_name), Some(stem)) = (
                    path.file_name().and_then(|n| n.to_str()),
                    path.file_stem().and_then(|n| n.to_str()),
                ) else {
                    continue;
                };
                documents.push(DocumentEntry {
                    id: file_name.to_string(),
                    title: stem.to_string(),
                    content_url: path.to_string_lossy().into_owned(),
                });
            }
            documents.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(documents)
        })
    }

    fn fetch_content(&self, entry: &DocumentEntry) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
        let path = PathBuf::from(&entry.content_url);
        Box::pin(async move {
            fs::read(&path).map_err(|e| TransportError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }
}
