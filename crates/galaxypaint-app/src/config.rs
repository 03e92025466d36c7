//! Application configuration and sink construction.

use crate::controller::AppController;
use crate::notify::Notifier;
use galaxypaint_core::brush::BrushColor;
use galaxypaint_core::collection::{CollectionClient, DocumentSource, ProxyCollectionClient};
use galaxypaint_core::host::{RequestProxy, SITE_GROUP_ID_KEY};
use galaxypaint_core::sink::{LocalDownload, PersistenceSink, RemoteCollectionUpload, RemoteProxyUpload};
use galaxypaint_core::surface::{DEFAULT_BRUSH_RADIUS, DEFAULT_CANVAS_SIZE, PixelSurface};
use galaxypaint_core::transport::{Endpoint, TransportError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Parse(String),
    #[error("The proxy sink needs a request proxy from the host")]
    MissingProxy,
    #[error("No site group id configured or supplied by the host")]
    MissingGroupId,
    #[error("No download directory configured and none could be found")]
    MissingDownloadDirectory,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where saved drawings go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Direct upload to the portal at `base_url`.
    Remote {
        base_url: String,
        #[serde(default)]
        site_group_id: Option<String>,
        #[serde(default)]
        bearer_token: Option<String>,
    },
    /// Upload relayed by the host's request proxy.
    Proxy {
        #[serde(default)]
        site_group_id: Option<String>,
    },
    /// Save to a local file.
    Download {
        #[serde(default)]
        directory: Option<PathBuf>,
        /// Folder of images offered as backgrounds.
        #[serde(default)]
        documents_dir: Option<PathBuf>,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Download {
            directory: None,
            documents_dir: None,
        }
    }
}

/// Application configuration, loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub brush_color: BrushColor,
    pub brush_radius: f64,
    pub hide_grid: bool,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub sink: SinkConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            brush_color: BrushColor::BLACK,
            brush_radius: DEFAULT_BRUSH_RADIUS,
            hide_grid: true,
            canvas_width: DEFAULT_CANVAS_SIZE,
            canvas_height: DEFAULT_CANVAS_SIZE,
            sink: SinkConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// A blank surface with the configured size and brush.
    pub fn surface(&self) -> PixelSurface {
        PixelSurface::new(self.canvas_width, self.canvas_height).with_brush_radius(self.brush_radius)
    }
}

/// Values only the embedding host can supply.
#[derive(Clone, Default)]
pub struct HostContext {
    pub site_group_id: Option<String>,
    pub proxy: Option<Rc<dyn RequestProxy>>,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.site_group_id = Some(group_id.into());
        self
    }

    pub fn with_proxy(mut self, proxy: Rc<dyn RequestProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

/// The sink and document source a configuration resolves to.
pub struct Deployment {
    pub sink: Rc<dyn PersistenceSink>,
    pub documents: Option<Rc<dyn DocumentSource>>,
}

/// Group id from the configuration, else from the host.
fn configured_group_id(configured: &Option<String>, host: &HostContext) -> Option<String> {
    configured.clone().or_else(|| host.site_group_id.clone())
}

/// Construct the sink and matching document source for `config`.
///
/// A proxy deployment with no known group id asks the proxy for one.
pub async fn resolve(config: &SinkConfig, host: &HostContext) -> ConfigResult<Deployment> {
    match config {
        SinkConfig::Remote {
            base_url,
            site_group_id,
            bearer_token,
        } => {
            let group_id = configured_group_id(site_group_id, host).ok_or(ConfigError::MissingGroupId)?;
            let endpoint = Endpoint::remote(base_url, group_id)?;
            let client = CollectionClient::new(endpoint).with_bearer_token(bearer_token.clone());
            log::info!("Saving to {}", client.endpoint().documents_url());
            Ok(Deployment {
                sink: Rc::new(RemoteCollectionUpload::from_client(client.clone())),
                documents: Some(Rc::new(client)),
            })
        }
        SinkConfig::Proxy { site_group_id } => {
            let proxy = host.proxy.clone().ok_or(ConfigError::MissingProxy)?;
            let group_id = match configured_group_id(site_group_id, host) {
                Some(id) => id,
                None => proxy.get(SITE_GROUP_ID_KEY).await?,
            };
            log::info!("Saving through the host proxy to site group {}", group_id);
            let endpoint = Endpoint::relative(group_id);
            Ok(Deployment {
                sink: Rc::new(RemoteProxyUpload::with_endpoint(proxy.clone(), endpoint.clone())),
                documents: Some(Rc::new(ProxyCollectionClient::new(proxy, endpoint))),
            })
        }
        SinkConfig::Download {
            directory,
            documents_dir,
        } => download_deployment(directory.as_deref(), documents_dir.as_deref()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn download_deployment(directory: Option<&Path>, documents_dir: Option<&Path>) -> ConfigResult<Deployment> {
    use galaxypaint_core::collection::DirectorySource;

    let sink = match directory {
        Some(dir) => LocalDownload::new(dir),
        None => LocalDownload::default_location().ok_or(ConfigError::MissingDownloadDirectory)?,
    };
    log::info!("Saving to {}", sink.directory().display());
    let documents = documents_dir.map(|dir| Rc::new(DirectorySource::new(dir)) as Rc<dyn DocumentSource>);
    Ok(Deployment {
        sink: Rc::new(sink),
        documents,
    })
}

#[cfg(target_arch = "wasm32")]
fn download_deployment(directory: Option<&Path>, documents_dir: Option<&Path>) -> ConfigResult<Deployment> {
    if directory.is_some() || documents_dir.is_some() {
        log::warn!("Directories are ignored in the browser; saving as a download");
    }
    Ok(Deployment {
        sink: Rc::new(LocalDownload::new()),
        documents: None,
    })
}

/// Only the sink for `config`.
pub async fn build_sink(config: &SinkConfig, host: &HostContext) -> ConfigResult<Rc<dyn PersistenceSink>> {
    Ok(resolve(config, host).await?.sink)
}

impl AppController<PixelSurface> {
    /// Build a controller over a fresh surface as `config` describes.
    pub async fn from_config(
        config: &AppConfig,
        host: &HostContext,
        notifier: Rc<dyn Notifier>,
    ) -> ConfigResult<Self> {
        let deployment = resolve(&config.sink, host).await?;
        let controller = Self::new(config.surface(), deployment.sink, notifier);
        controller.set_brush(config.brush_color);
        controller.set_hide_grid(config.hide_grid);
        Ok(match deployment.documents {
            Some(documents) => controller.with_documents(documents),
            None => controller,
        })
    }
}
