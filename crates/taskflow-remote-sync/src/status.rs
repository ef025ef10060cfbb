//! Read-only sync status.
//!
//! Runs the same comparison as a reconciliation, without writing to
//! either side.

use serde::Serialize;
use taskflow_remote_core::{Digest, SyncMetadata, SyncOptions, VersionToken};
use taskflow_remote_store::{LocalStore, MetadataStore};

use crate::engine::{decide, Decision};
use crate::error::Result;
use crate::remote::RemoteStore;

/// Snapshot of both sides relative to the last agreement point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub remote_version: VersionToken,
    pub stored: SyncMetadata,
    pub local_hash: Digest,
    pub remote_hash: Digest,
    pub local_changed: bool,
    pub remote_changed: bool,
    /// What a plain `sync` would do now.
    pub planned: Decision,
}

impl SyncStatus {
    pub fn in_sync(&self) -> bool {
        self.planned == Decision::UpToDate
    }
}

/// Compare local, remote and metadata without mutating anything.
pub async fn inspect<L, M, R>(local: &L, metadata: &M, remote: &R) -> Result<SyncStatus>
where
    L: LocalStore,
    M: MetadataStore,
    R: RemoteStore,
{
    let stored = metadata.read_metadata().await?;
    let local_hash = local.read_local().await?.digest();
    let snapshot = remote.fetch().await?;

    let planned = decide(&stored, &local_hash, &snapshot.version, &SyncOptions::new())?;
    let first = stored.is_first_sync();

    Ok(SyncStatus {
        local_changed: !first && !stored.local_unchanged(&local_hash),
        remote_changed: !first && snapshot.version != stored.last_version,
        remote_hash: snapshot.digest(),
        remote_version: snapshot.version,
        stored,
        local_hash,
        planned,
    })
}
