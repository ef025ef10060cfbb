//! Store traits: the abstract interfaces for local persistence.
//!
//! These traits keep the reconciliation engine storage-agnostic.
//! Implementations include files + SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use bytes::Bytes;
use taskflow_remote_core::{Digest, LocalSnapshot, SyncMetadata, VersionToken};

use crate::error::Result;

/// Access to the local main + archive documents.
///
/// # Design Notes
///
/// - **Missing archive**: `read_local` substitutes the empty-collection
///   document. Only an unreadable main document is an error.
/// - **Validated writes**: `write_local` checks the collection marker in
///   `main` before touching anything and fails with
///   [`StoreError::Validation`](crate::StoreError::Validation).
/// - **No rollback**: if main is replaced but the archive write fails, the
///   error is surfaced and the main document stays replaced.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read both documents.
    async fn read_local(&self) -> Result<LocalSnapshot>;

    /// Overwrite both documents.
    async fn write_local(&self, main: &Bytes, archive: &Bytes) -> Result<()>;
}

/// Persistence of the last agreement point between local and remote.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the stored metadata.
    ///
    /// Absent storage reads as [`SyncMetadata::empty`].
    async fn read_metadata(&self) -> Result<SyncMetadata>;

    /// Record a new agreement point.
    ///
    /// Both fields are written together or not at all.
    async fn write_metadata(&self, version: &VersionToken, local_hash: &Digest) -> Result<()>;
}
