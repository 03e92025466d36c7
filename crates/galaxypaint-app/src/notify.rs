//! Transient user notifications (toasts).

use galaxypaint_core::sink::SaveOutcome;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Shown when saving without a document name.
pub const VALIDATION_MESSAGE: &str = "You must specify a name for the document";

/// Prefix of the message shown when a commit fails.
pub const UPLOAD_ERROR_MESSAGE: &str = "An error occurred uploading your document";

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

/// A transient message for the user, in the shape the host's toast API takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Danger,
        }
    }

    /// The toast for a finished commit.
    pub fn for_outcome(outcome: &SaveOutcome, success_message: &str) -> Self {
        match outcome {
            SaveOutcome::Success => Self::success(success_message),
            SaveOutcome::Conflict(title) => Self::danger(title.clone()),
            SaveOutcome::Error(detail) => Self::danger(format!("{}: {}", UPLOAD_ERROR_MESSAGE, detail)),
        }
    }

    pub fn is_danger(&self) -> bool {
        self.kind == NotificationKind::Danger
    }
}

/// Receiver of notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// FIFO of notifications waiting to be shown by the presentation layer.
#[derive(Debug, Default)]
pub struct ToastQueue {
    queue: RefCell<VecDeque<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest notification.
    pub fn pop(&self) -> Option<Notification> {
        self.queue.borrow_mut().pop_front()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        self.queue.borrow_mut().push_back(notification);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => log::info!("{}", notification.message),
            NotificationKind::Danger => log::warn!("{}", notification.message),
        }
    }
}
