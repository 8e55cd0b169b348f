//! Notification capability.
//!
//! Delivery (desktop toasts, sounds) is implemented outside the core; the
//! engine only says what should be shown.

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Every notification sink implements this trait.
pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);

    /// Play a named sound. Default no-op for sinks without audio.
    fn play_sound(&self, _id: &str) {}
}

/// Routes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        info!(title = %notification.title, "{}", notification.message);
    }
}
