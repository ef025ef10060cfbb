//! Error types for the facade.

use std::path::PathBuf;

use taskflow_remote_core::ModeError;
use taskflow_remote_store::StoreError;
use taskflow_remote_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during facade operations.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No gist id has been stored yet.
    #[error("no gist configured; run gist-init first")]
    NotConfigured,

    /// Storage directory could not be prepared.
    #[error("failed to prepare {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local document or metadata error.
    #[error("local {0}")]
    Store(#[from] StoreError),

    /// Remote or reconciliation error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Invalid resolution mode.
    #[error(transparent)]
    Mode(#[from] ModeError),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_remote_core::SyncOptions;

    #[test]
    fn test_bad_mode_surfaces_as_mode_error() {
        let err = RemoteError::from(SyncOptions::from_flags(true, Some("sideways")).unwrap_err());
        assert!(matches!(err, RemoteError::Mode(ModeError::Invalid(ref m)) if m == "sideways"));
        assert_eq!(
            err.to_string(),
            "invalid mode `sideways`: --mode must be 'push' or 'pull'"
        );
    }
}
