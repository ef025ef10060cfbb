//! Reconciliation engine.
//!
//! One reconciliation compares three points: the metadata recorded at the
//! last agreement, the current local snapshot and the current remote
//! snapshot. It then takes at most one action.
//!
//! ```text
//! read metadata -> read local -> fetch remote -> decide
//!   FirstSync / FastForward / ForcedPull:  write local -> re-read -> write metadata
//!   Push / ForcedPush:                     push remote -> write metadata
//!   UpToDate / Diverged:                   nothing
//! ```
//!
//! Any failure aborts the run. Metadata is always written last, so a
//! failed action never advances the agreement point.

use std::fmt;

use serde::Serialize;
use taskflow_remote_core::{
    Digest, ForceMode, LocalSnapshot, ModeError, RemoteSnapshot, SyncMetadata, SyncOptions,
    VersionToken,
};
use taskflow_remote_store::{LocalStore, MetadataStore};
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::remote::RemoteStore;

/// The action a reconciliation will take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// No prior agreement point: adopt the remote.
    FirstSync,
    /// Neither side changed.
    UpToDate,
    /// Only the local side changed.
    Push,
    /// Only the remote side changed.
    FastForward,
    /// Both sides changed and no override was given.
    Diverged,
    /// Both sides changed, local wins.
    ForcedPush,
    /// Both sides changed, remote wins.
    ForcedPull,
}

/// Choose the action for one reconciliation.
///
/// Pure: no I/O. Fails only when both sides changed, `force` is set and no
/// mode was given. A mode without `force` is ignored, and `force` is
/// ignored unless both sides changed.
pub fn decide(
    meta: &SyncMetadata,
    local_hash: &Digest,
    remote_version: &VersionToken,
    options: &SyncOptions,
) -> std::result::Result<Decision, ModeError> {
    if meta.is_first_sync() {
        return Ok(Decision::FirstSync);
    }

    let local_changed = !meta.local_unchanged(local_hash);
    let remote_changed = remote_version != &meta.last_version;

    let decision = match (local_changed, remote_changed) {
        (false, false) => Decision::UpToDate,
        (true, false) => Decision::Push,
        (false, true) => Decision::FastForward,
        (true, true) if !options.force => Decision::Diverged,
        (true, true) => match options.mode {
            Some(ForceMode::Push) => Decision::ForcedPush,
            Some(ForceMode::Pull) => Decision::ForcedPull,
            None => return Err(ModeError::Missing),
        },
    };
    Ok(decision)
}

/// The three hashes reported when both sides changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// Local hash recorded at the last agreement.
    pub stored_local_hash: Option<Digest>,
    pub current_local_hash: Digest,
    pub remote_hash: Digest,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    FirstSyncPulled { version: VersionToken },
    UpToDate,
    Pushed { version: VersionToken },
    FastForwarded { version: VersionToken },
    /// Nothing was written.
    Diverged(Divergence),
    ForcedPull { version: VersionToken },
    ForcedPush { version: VersionToken },
}

impl SyncOutcome {
    pub fn is_diverged(&self) -> bool {
        matches!(self, SyncOutcome::Diverged(_))
    }

    /// The decision that produced this outcome.
    pub fn decision(&self) -> Decision {
        match self {
            SyncOutcome::FirstSyncPulled { .. } => Decision::FirstSync,
            SyncOutcome::UpToDate => Decision::UpToDate,
            SyncOutcome::Pushed { .. } => Decision::Push,
            SyncOutcome::FastForwarded { .. } => Decision::FastForward,
            SyncOutcome::Diverged(_) => Decision::Diverged,
            SyncOutcome::ForcedPull { .. } => Decision::ForcedPull,
            SyncOutcome::ForcedPush { .. } => Decision::ForcedPush,
        }
    }

    /// The remote version recorded by this run, if it recorded one.
    pub fn version(&self) -> Option<&VersionToken> {
        match self {
            SyncOutcome::FirstSyncPulled { version }
            | SyncOutcome::Pushed { version }
            | SyncOutcome::FastForwarded { version }
            | SyncOutcome::ForcedPull { version }
            | SyncOutcome::ForcedPush { version } => Some(version),
            SyncOutcome::UpToDate | SyncOutcome::Diverged(_) => None,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::FirstSyncPulled { .. } => write!(f, "First sync: pulled remote state."),
            SyncOutcome::UpToDate => write!(f, "Already up to date (no changes)."),
            SyncOutcome::Pushed { .. } => write!(f, "Sync: pushed local changes."),
            SyncOutcome::FastForwarded { .. } => {
                write!(f, "Fast-forward: pulled remote changes.")
            }
            SyncOutcome::Diverged(d) => {
                writeln!(
                    f,
                    "Divergence detected: local and remote both changed since last sync."
                )?;
                writeln!(f, "Re-run with --force --mode push or --force --mode pull.")?;
                writeln!(
                    f,
                    "Stored local hash:  {}",
                    d.stored_local_hash.map(|h| h.to_hex()).unwrap_or_default()
                )?;
                writeln!(f, "Current local hash: {}", d.current_local_hash)?;
                write!(f, "Remote hash:        {}", d.remote_hash)
            }
            SyncOutcome::ForcedPull { .. } => write!(f, "Forced pull applied."),
            SyncOutcome::ForcedPush { .. } => write!(f, "Forced push applied."),
        }
    }
}

/// Drives reconciliation between a local store and a remote store.
pub struct Reconciler<L, M, R> {
    local: L,
    metadata: M,
    remote: R,
}

impl<L: LocalStore, M: MetadataStore, R: RemoteStore> Reconciler<L, M, R> {
    pub fn new(local: L, metadata: M, remote: R) -> Self {
        Self {
            local,
            metadata,
            remote,
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Run one reconciliation.
    ///
    /// A divergence without override is reported as
    /// [`SyncOutcome::Diverged`], not as an error.
    pub async fn reconcile(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let meta = self.metadata.read_metadata().await?;
        let local = self.local.read_local().await?;
        let remote = self.remote.fetch().await?;

        let local_hash = local.digest();
        debug!(
            last_version = %meta.last_version,
            remote_version = %remote.version,
            local_hash = ?local_hash,
            "comparing sync state"
        );

        let decision = decide(&meta, &local_hash, &remote.version, options)?;
        debug!(?decision, "reconciliation decision");

        let outcome = match decision {
            Decision::FirstSync => {
                let version = self.apply_pull(&remote).await?;
                SyncOutcome::FirstSyncPulled { version }
            }
            Decision::UpToDate => SyncOutcome::UpToDate,
            Decision::Push => {
                let version = self.apply_push(&local, local_hash).await?;
                SyncOutcome::Pushed { version }
            }
            Decision::FastForward => {
                let version = self.apply_pull(&remote).await?;
                SyncOutcome::FastForwarded { version }
            }
            Decision::Diverged => {
                let divergence = Divergence {
                    stored_local_hash: meta.last_local_hash,
                    current_local_hash: local_hash,
                    remote_hash: remote.digest(),
                };
                warn!(
                    last_version = %meta.last_version,
                    remote_version = %remote.version,
                    "local and remote diverged"
                );
                SyncOutcome::Diverged(divergence)
            }
            Decision::ForcedPush => {
                let version = self.apply_push(&local, local_hash).await?;
                SyncOutcome::ForcedPush { version }
            }
            Decision::ForcedPull => {
                let version = self.apply_pull(&remote).await?;
                SyncOutcome::ForcedPull { version }
            }
        };

        if let Some(version) = outcome.version() {
            info!(?decision, version = %version, "sync applied");
        }
        Ok(outcome)
    }

    /// Replace local with remote, then record the hash of what landed.
    async fn apply_pull(&self, remote: &RemoteSnapshot) -> Result<VersionToken> {
        self.local.write_local(&remote.main, &remote.archive).await?;
        let landed = self.local.read_local().await?.digest();
        self.metadata
            .write_metadata(&remote.version, &landed)
            .await?;
        Ok(remote.version.clone())
    }

    /// Replace remote with local, then record the new remote version.
    ///
    /// An empty version would read as a first sync next time and pull over
    /// local edits, so it is rejected and metadata is left alone.
    async fn apply_push(&self, local: &LocalSnapshot, local_hash: Digest) -> Result<VersionToken> {
        let version = self.remote.push(&local.main, &local.archive).await?;
        if version.is_empty() {
            return Err(SyncError::decode("push", "remote returned an empty version"));
        }
        self.metadata.write_metadata(&version, &local_hash).await?;
        Ok(version)
    }
}
