//! Test fixtures and helpers.
//!
//! Common setup code for reconciliation tests.

use bytes::Bytes;
use taskflow_remote_core::{hash_pair, SyncMetadata, SyncOptions, VersionToken, EMPTY_COLLECTION};
use taskflow_remote_store::{MemoryLocalStore, MemoryMetadataStore};
use taskflow_remote_sync::{MemoryRemote, Reconciler, Result, SyncOutcome};

/// Reconciler over the in-memory stores.
pub type MemoryReconciler = Reconciler<MemoryLocalStore, MemoryMetadataStore, MemoryRemote>;

/// Build a task document with one task per title.
///
/// No titles gives the empty collection.
pub fn task_document(titles: &[&str]) -> Bytes {
    if titles.is_empty() {
        return Bytes::from_static(EMPTY_COLLECTION);
    }
    let mut doc = String::from("tasks:\n");
    for (i, title) in titles.iter().enumerate() {
        doc.push_str(&format!("- id: {}\n  title: {}\n", i + 1, title));
    }
    Bytes::from(doc)
}

/// One client (local documents + metadata) attached to an in-memory remote.
#[derive(Clone)]
pub struct SyncFixture {
    pub local: MemoryLocalStore,
    pub metadata: MemoryMetadataStore,
    pub remote: MemoryRemote,
}

impl SyncFixture {
    /// A client that has never synced.
    pub fn unsynced(local_main: impl Into<Bytes>, remote_main: impl Into<Bytes>) -> Self {
        Self {
            local: MemoryLocalStore::with_documents(local_main, EMPTY_COLLECTION),
            metadata: MemoryMetadataStore::new(),
            remote: MemoryRemote::new(remote_main, EMPTY_COLLECTION),
        }
    }

    /// A client in agreement with the remote at `v1`.
    pub fn synced(main: impl Into<Bytes>) -> Self {
        let main = main.into();
        let metadata = SyncMetadata::new("v1".into(), hash_pair(&main, EMPTY_COLLECTION));
        Self {
            local: MemoryLocalStore::with_documents(main.clone(), EMPTY_COLLECTION),
            metadata: MemoryMetadataStore::with_metadata(metadata),
            remote: MemoryRemote::new(main, EMPTY_COLLECTION),
        }
    }

    /// Another never-synced client sharing this fixture's remote.
    pub fn second_client(&self, local_main: impl Into<Bytes>) -> Self {
        Self {
            local: MemoryLocalStore::with_documents(local_main, EMPTY_COLLECTION),
            metadata: MemoryMetadataStore::new(),
            remote: self.remote.clone(),
        }
    }

    pub fn reconciler(&self) -> MemoryReconciler {
        Reconciler::new(self.local.clone(), self.metadata.clone(), self.remote.clone())
    }

    pub async fn sync(&self) -> Result<SyncOutcome> {
        self.reconciler().reconcile(&SyncOptions::new()).await
    }

    pub async fn sync_with(&self, options: SyncOptions) -> Result<SyncOutcome> {
        self.reconciler().reconcile(&options).await
    }

    /// Simulate the user editing the main document.
    pub fn edit_local(&self, main: impl Into<Bytes>) {
        self.local.set_main(main);
    }

    /// Simulate another client pushing.
    pub fn edit_remote(&self, main: impl Into<Bytes>) -> VersionToken {
        self.remote.set_remote(main, EMPTY_COLLECTION)
    }

    /// Local main document, empty if missing.
    pub fn local_main(&self) -> Bytes {
        self.local.main().unwrap_or_default()
    }

    /// Whether local and remote hold identical documents.
    pub fn converged(&self) -> bool {
        let local_archive = self
            .local
            .archive()
            .unwrap_or_else(|| Bytes::from_static(EMPTY_COLLECTION));
        let remote_archive = self
            .remote
            .archive()
            .unwrap_or_else(|| Bytes::from_static(EMPTY_COLLECTION));
        self.local_main() == self.remote.main() && local_archive == remote_archive
    }
}
