//! Server data source error types

/// Errors returned by a [`ServerSideDataSource`](crate::server::ServerSideDataSource).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataSourceError {
    /// The fetch was cancelled because a newer request superseded it.
    #[error("Request cancelled")]
    Cancelled,

    /// The backend reported a failure.
    #[error("Fetch failed: {message}")]
    Failed { message: String },
}

impl DataSourceError {
    /// Creates a new fetch failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Returns `true` if the request was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
