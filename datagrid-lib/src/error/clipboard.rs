//! Clipboard error types

/// Errors returned by a [`ClipboardProvider`](crate::export::ClipboardProvider).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ClipboardError {
    /// Error message.
    pub message: String,
}

impl ClipboardError {
    /// Create a new clipboard error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
