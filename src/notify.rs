//! Toast Notifications
//!
//! Success, warning and error messages queued for the UI. Every failed
//! operation ends here exactly once; nothing is retried.

use std::sync::{Arc, Mutex};

use crate::api::ApiError;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Error,
}

impl ToastKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastKind::Success => "✓",
            ToastKind::Info => "ℹ",
            ToastKind::Warning => "⚠",
            ToastKind::Error => "✕",
        }
    }
}

/// A queued message
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Shared toast queue
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    queue: Arc<Mutex<Vec<Toast>>>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: ToastKind, message: impl Into<String>) {
        let toast = Toast {
            kind,
            message: message.into(),
        };
        match kind {
            ToastKind::Error => tracing::error!("{}", toast.message),
            ToastKind::Warning => tracing::warn!("{}", toast.message),
            _ => tracing::info!("{}", toast.message),
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push(toast);
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ToastKind::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(ToastKind::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ToastKind::Error, message);
    }

    /// Report an API failure with a context prefix
    pub fn api_error(&self, context: &str, error: &ApiError) {
        self.error(format!("{}: {}", context, error.user_message()));
    }

    /// Take every queued toast
    pub fn drain(&self) -> Vec<Toast> {
        self.queue
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().map(|q| q.is_empty()).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue() {
        let toasts = Toasts::new();
        toasts.success("Saved");
        toasts.api_error("Could not load people", &ApiError::Timeout);

        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].kind, ToastKind::Success);
        assert_eq!(
            drained[1].message,
            "Could not load people: The server took too long to respond"
        );
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_clones_share_queue() {
        let toasts = Toasts::new();
        toasts.clone().warning("Heads up");
        assert_eq!(toasts.drain()[0].kind.icon(), "⚠");
    }
}
