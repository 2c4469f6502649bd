//! Grid error types

/// Errors produced inside the grid core.
///
/// None of these are fatal. The public surface logs them and leaves the
/// previous state in place.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A command targeted a row id that is not in the row set.
    #[error("Row '{id}' not found")]
    RowNotFound { id: String },

    /// A command was called with unusable input (empty arrays, missing ids).
    #[error("Malformed command '{command}': {reason}")]
    MalformedCommand {
        command: &'static str,
        reason: String,
    },

    /// An ingress check rejected the action for the calling origin.
    #[error("Origin '{origin}' is not allowed to perform '{action}'")]
    PermissionDenied { origin: String, action: String },

    /// No clipboard provider is installed on the grid.
    #[error("Clipboard API unavailable")]
    ClipboardUnavailable,

    /// The clipboard provider failed.
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] super::ClipboardError),

    /// The server-side data source failed.
    #[error("Data source error: {0}")]
    DataSource(#[from] super::DataSourceError),

    /// A server fetch was requested outside of a tokio runtime.
    #[error("No async runtime available to schedule server fetch")]
    NoRuntime,

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl GridError {
    /// Creates a new row-not-found error.
    pub fn row_not_found(id: impl Into<String>) -> Self {
        Self::RowNotFound { id: id.into() }
    }

    /// Creates a new malformed-command error.
    pub fn malformed(command: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            command,
            reason: reason.into(),
        }
    }

    /// Creates a new permission-denied error.
    pub fn denied(origin: impl Into<String>, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            origin: origin.into(),
            action: action.into(),
        }
    }
}
