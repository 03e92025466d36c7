//! Local download of the raster, for the standalone build.

use super::{PersistenceSink, SaveOutcome};
use crate::raster::RasterBlob;
use crate::transport::BoxFuture;

/// Make a document name safe to use as a file name.
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "drawing".to_string()
    } else {
        stem
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use super::*;
    use std::cell::RefCell;
    use std::fs::{self, OpenOptions};
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};

    /// Highest " (n)" suffix tried before giving up.
    const MAX_DUPLICATE_SUFFIX: u32 = 999;

    /// Writes `<name>.png` into a downloads directory.
    ///
    /// Existing files are never overwritten: like a browser, the sink falls
    /// back to `<name> (1).png`, `<name> (2).png`, and so on.
    #[derive(Debug, Clone)]
    pub struct LocalDownload {
        directory: PathBuf,
        /// File name chosen by the last successful commit.
        last_saved: RefCell<Option<String>>,
    }

    impl LocalDownload {
        pub fn new(directory: impl Into<PathBuf>) -> Self {
            Self {
                directory: directory.into(),
                last_saved: RefCell::new(None),
            }
        }

        /// The platform download directory, or the home directory.
        pub fn default_location() -> Option<Self> {
            dirs::download_dir().or_else(dirs::home_dir).map(Self::new)
        }

        pub fn directory(&self) -> &Path {
            &self.directory
        }

        fn write_unique(&self, stem: &str, bytes: &[u8]) -> io::Result<PathBuf> {
            fs::create_dir_all(&self.directory)?;
            for n in 0..=MAX_DUPLICATE_SUFFIX {
                let file_name = if n == 0 {
                    RasterBlob::file_name(stem)
                } else {
                    RasterBlob::file_name(&format!("{} ({})", stem, n))
                };
                let path = self.directory.join(file_name);
                match OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(mut file) => {
                        file.write_all(bytes)?;
                        return Ok(path);
                    }
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                    Err(e) => return Err(e),
                }
            }
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Too many files named {}", RasterBlob::file_name(stem)),
            ))
        }
    }

    impl PersistenceSink for LocalDownload {
        fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome> {
            let stem = sanitize_file_stem(name);
            Box::pin(async move {
                match self.write_unique(&stem, &raster.bytes) {
                    Ok(path) => {
                        log::info!("Saved drawing to {}", path.display());
                        let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
                        *self.last_saved.borrow_mut() = file_name;
                        SaveOutcome::Success
                    }
                    Err(e) => {
                        log::error!("Failed to save drawing in {}: {}", self.directory.display(), e);
                        self.last_saved.borrow_mut().take();
                        SaveOutcome::Error(format!("Failed to write {}: {}", RasterBlob::file_name(&stem), e))
                    }
                }
            })
        }

        fn success_message(&self, name: &str) -> String {
            let file_name = self
                .last_saved
                .borrow()
                .clone()
                .unwrap_or_else(|| RasterBlob::file_name(&sanitize_file_stem(name)));
            format!("Saved {}", file_name)
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use wasm_bindgen::{JsCast, JsValue};

    /// Triggers a browser download of `<name>.png`.
    #[derive(Debug, Clone, Default)]
    pub struct LocalDownload;

    impl LocalDownload {
        pub fn new() -> Self {
            Self
        }

        fn download(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
            let window = web_sys::window().ok_or("No window")?;
            let document = window.document().ok_or("No document")?;

            let uint8_array = js_sys::Uint8Array::from(bytes);
            let blob_parts = js_sys::Array::new();
            blob_parts.push(&uint8_array);

            let options = web_sys::BlobPropertyBag::new();
            options.set_type(crate::raster::PNG_MIME);
            let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&blob_parts, &options)?;

            let url = web_sys::Url::create_object_url_with_blob(&blob)?;
            let anchor = document
                .create_element("a")?
                .dyn_into::<web_sys::HtmlAnchorElement>()?;
            anchor.set_href(&url);
            anchor.set_download(file_name);
            anchor.click();

            // The download has started; a failed cleanup only leaks the URL.
            if let Err(e) = web_sys::Url::revoke_object_url(&url) {
                log::warn!("Failed to revoke object URL for {}: {:?}", file_name, e);
            }
            Ok(())
        }
    }

    impl PersistenceSink for LocalDownload {
        fn commit(&self, name: &str, raster: RasterBlob) -> BoxFuture<'_, SaveOutcome> {
            let file_name = RasterBlob::file_name(&sanitize_file_stem(name));
            Box::pin(async move {
                match Self::download(&file_name, &raster.bytes) {
                    Ok(()) => SaveOutcome::Success,
                    Err(e) => {
                        log::error!("Download of {} failed: {:?}", file_name, e);
                        SaveOutcome::Error(format!("Download of {} failed", file_name))
                    }
                }
            })
        }

        fn success_message(&self, name: &str) -> String {
            format!("Saved {}", RasterBlob::file_name(&sanitize_file_stem(name)))
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::LocalDownload;

#[cfg(target_arch = "wasm32")]
pub use web::LocalDownload;
