//! Notification dispatch
//!
//! The device notification capability sits behind the `Notifier` trait:
//! a permission query plus a display call carrying a de-duplication tag the
//! platform collapses. When permission is missing, callers fall back to the
//! in-app toast channel so the user is never silently unnotified while the
//! app is running.

use crate::error::Result;
use tokio::sync::mpsc;

/// A user-facing alert handed to the platform notifier
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Platform de-duplication tag; duplicate tags collapse
    pub tag: String,
}

pub trait Notifier: Send + Sync {
    /// Whether the platform notification permission is granted
    fn is_permitted(&self) -> bool;

    fn notify(&self, notification: Notification) -> Result<()>;
}

/// Notifier that writes to the diagnostic log. Stands in where no desktop
/// notification surface is wired up.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn is_permitted(&self) -> bool {
        true
    }

    fn notify(&self, notification: Notification) -> Result<()> {
        tracing::info!(
            "Notification [{}]: {} - {}",
            notification.tag,
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// Transient in-app message shown when the platform channel is unavailable
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub body: String,
}

pub type ToastSender = mpsc::UnboundedSender<Toast>;
pub type ToastReceiver = mpsc::UnboundedReceiver<Toast>;

pub fn toast_channel() -> (ToastSender, ToastReceiver) {
    mpsc::unbounded_channel()
}
