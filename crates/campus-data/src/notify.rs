//! Outcome notifications for campus-data
//!
//! Every failure and every successful mutation produces one notification so
//! a consuming UI can react (toast, banner) without inspecting internals.
//! The presentation mechanism itself lives outside this layer; here it is a
//! trait with a log-backed default and a capturing double for tests.

use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Successful outcome
    Info,
    /// Designed degradation (e.g. switched to the in-memory fallback)
    Warning,
    /// Hard failure surfaced to the caller
    Error,
}

/// One caller-facing outcome report
#[derive(Debug, Clone)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Human-readable outcome description
    pub message: String,
    /// True when the affected data lives only in memory for this session
    /// (fallback mode) and is lost on process end.
    pub session_only: bool,
}

impl Notification {
    /// Successful outcome
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            session_only: false,
        }
    }

    /// Designed degradation
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
            session_only: false,
        }
    }

    /// Hard failure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            session_only: false,
        }
    }

    /// Flag the outcome as session-only (in-memory data, never persisted)
    pub fn session_only(mut self) -> Self {
        self.session_only = true;
        self
    }
}

/// Notification sink
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    fn notify(&self, notification: Notification);
}

/// Default notifier: routes outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => info!(
                session_only = notification.session_only,
                "{}", notification.message
            ),
            NotificationLevel::Warning => warn!(
                session_only = notification.session_only,
                "{}", notification.message
            ),
            NotificationLevel::Error => error!(
                session_only = notification.session_only,
                "{}", notification.message
            ),
        }
    }
}

/// Capturing notifier for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    /// Create an empty capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications delivered so far
    pub fn captured(&self) -> Vec<Notification> {
        self.entries.lock().expect("notifier lock poisoned").clone()
    }

    /// Number of notifications delivered so far
    pub fn count(&self) -> usize {
        self.entries.lock().expect("notifier lock poisoned").len()
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        self.entries.lock().expect("notifier lock poisoned").clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
    }
}
