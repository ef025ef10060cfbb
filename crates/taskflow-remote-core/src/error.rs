//! Error types for the taskflow remote core.

use thiserror::Error;

/// Core errors from parsing and converting primitive values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// Validation errors for documents about to overwrite local state.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("main document is missing the `{marker}` collection key ({len} bytes)")]
    MissingMarker { marker: &'static str, len: usize },
}

/// Errors in the operator-supplied resolution mode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    /// `force` was requested without saying which side wins.
    #[error("--mode required with --force (push or pull)")]
    Missing,

    /// The mode string is neither `push` nor `pull`.
    #[error("invalid mode `{0}`: --mode must be 'push' or 'pull'")]
    Invalid(String),
}
