//! User-facing notifications.
//!
//! Components never let an error reach the caller un-notified: each public
//! operation converts its outcome into a [`Notice`] and hands it to the
//! injected [`Notifier`]. How notices are presented (toasts, a status line,
//! stderr) is up to the front end.

use tokio::sync::mpsc;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => tracing::info!(notice = %notice.message),
            Severity::Warning => tracing::warn!(notice = %notice.message),
            Severity::Error => tracing::error!(notice = %notice.message),
        }
    }
}

/// Forwards notices to a channel drained by the front end.
impl Notifier for mpsc::UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        if self.send(notice).is_err() {
            tracing::debug!("Notice receiver dropped");
        }
    }
}
