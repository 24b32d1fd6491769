//! User-facing upload notifications (toasts)

use serde::Serialize;
use tokio::sync::mpsc;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message summarizing one upload outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn uploaded(file_name: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Upload Successful".to_string(),
            message: format!("{} has been uploaded successfully.", file_name),
        }
    }

    pub fn rejected(file_name: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Upload Failed".to_string(),
            message: format!("Failed to upload {}. Please try again.", file_name),
        }
    }

    pub fn faulted(file_name: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Upload Error".to_string(),
            message: format!("An error occurred while uploading {}.", file_name),
        }
    }
}

/// Sink for upload notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(title = %notification.title, "{}", notification.message)
            }
            NotificationKind::Error => {
                tracing::warn!(title = %notification.title, "{}", notification.message)
            }
        }
    }
}

/// Forwards notifications over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        // Receiver gone means nobody is displaying toasts anymore
        let _ = self.tx.send(notification);
    }
}
