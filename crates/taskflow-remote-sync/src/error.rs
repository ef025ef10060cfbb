//! Error types for the sync module.

use taskflow_remote_core::ModeError;
use taskflow_remote_store::StoreError;
use thiserror::Error;

/// Errors that can occur during sync operations.
///
/// Every error aborts the current reconciliation. Nothing is retried.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No access token available. Raised before any network call.
    #[error("missing credentials: environment variable {env} is not set")]
    CredentialMissing { env: &'static str },

    /// Transport failure or unexpected HTTP status from the remote.
    #[error("remote {op} failed{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Network {
        op: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The remote answered with a body we could not understand.
    #[error("invalid remote {op} response: {message}")]
    Decode { op: &'static str, message: String },

    /// Local content cannot be represented on the remote.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Local document or metadata store failed.
    #[error("local {0}")]
    Store(#[from] StoreError),

    /// Missing or unrecognized resolution mode.
    #[error(transparent)]
    Mode(#[from] ModeError),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Background(String),
}

impl SyncError {
    pub(crate) fn network(
        op: &'static str,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        SyncError::Network {
            op,
            status,
            message: message.into(),
        }
    }

    pub(crate) fn decode(op: &'static str, message: impl ToString) -> Self {
        SyncError::Decode {
            op,
            message: message.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(e: tokio::task::JoinError) -> Self {
        SyncError::Background(e.to_string())
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
