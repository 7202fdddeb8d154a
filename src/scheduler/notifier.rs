use serde::Serialize;
use tracing::info;

use crate::error::AppResult;

/// Something to show the user outside of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Delivery seam for scheduler notifications.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> AppResult<()>;
}

/// Writes notifications as structured log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) -> AppResult<()> {
        info!(
            target: "arc::notify",
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}
