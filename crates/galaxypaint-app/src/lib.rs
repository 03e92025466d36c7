//! Galaxy Paint App Library
//!
//! The controller that ties a drawing surface, the compositing exporter and a
//! persistence sink together, plus configuration and user notifications.

pub mod config;
pub mod controller;
pub mod notify;

pub use config::{AppConfig, ConfigError, ConfigResult, Deployment, HostContext, SinkConfig, build_sink, resolve};
pub use controller::{AppController, BackgroundSelection, BackgroundSource, ControllerState, SaveError};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier, ToastQueue};
