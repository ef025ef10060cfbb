//! Strong type definitions for remote versions and sync metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::Digest;

/// Opaque version identifier returned by the remote store after a write.
///
/// Tokens are compared for equality only. They carry no ordering: the
/// remote may hand out any string, and an empty token means the remote
/// reported no history at all.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token string as returned by the remote.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The empty token (remote has no history / nothing recorded yet).
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Whether this is the empty token.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionToken({:?})", self.0)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The last point where local and remote were known to agree.
///
/// Both fields are written together as the final step of a successful
/// reconciliation action. An empty `last_version` means there is no prior
/// agreement point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Remote version recorded after the last successful action.
    pub last_version: VersionToken,
    /// Digest of the local snapshot right after that action.
    pub last_local_hash: Option<Digest>,
}

impl SyncMetadata {
    /// Create metadata for a completed action.
    pub fn new(last_version: VersionToken, last_local_hash: Digest) -> Self {
        Self {
            last_version,
            last_local_hash: Some(last_local_hash),
        }
    }

    /// The all-empty value (never synced).
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no prior agreement point exists.
    pub fn is_first_sync(&self) -> bool {
        self.last_version.is_empty()
    }

    /// Whether `digest` matches the recorded local hash.
    pub fn local_unchanged(&self, digest: &Digest) -> bool {
        self.last_local_hash.as_ref() == Some(digest)
    }

    /// Stored local hash as hex, or empty string if none was recorded.
    pub fn last_local_hash_hex(&self) -> String {
        self.last_local_hash
            .map(|d| d.to_hex())
            .unwrap_or_default()
    }
}
