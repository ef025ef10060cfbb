//! In-memory implementations of the store traits.
//!
//! These are primarily for testing. They have the same semantics as the
//! file and SQLite stores but keep everything in memory with no persistence.
//! Both are cheap to clone; clones share state.

use std::io::ErrorKind;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use taskflow_remote_core::{
    validate_main_document, Digest, LocalSnapshot, SyncMetadata, VersionToken,
};

use crate::error::{Result, StoreError};
use crate::traits::{LocalStore, MetadataStore};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory local documents.
#[derive(Clone, Default)]
pub struct MemoryLocalStore {
    inner: Arc<RwLock<MemoryDocs>>,
}

#[derive(Default)]
struct MemoryDocs {
    /// Main document; `None` reads like a missing file.
    main: Option<Bytes>,
    /// Archive document; `None` reads as the empty collection.
    archive: Option<Bytes>,
    /// Number of successful `write_local` calls.
    writes: usize,
}

impl MemoryLocalStore {
    /// Create a store with no documents at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given documents.
    pub fn with_documents(main: impl Into<Bytes>, archive: impl Into<Bytes>) -> Self {
        let store = Self::new();
        store.set_documents(main, archive);
        store
    }

    /// Create a store holding only a main document.
    pub fn with_main(main: impl Into<Bytes>) -> Self {
        let store = Self::new();
        store.set_main(main);
        store
    }

    /// Replace the documents directly, bypassing validation.
    ///
    /// Simulates the user editing tasks between syncs.
    pub fn set_documents(&self, main: impl Into<Bytes>, archive: impl Into<Bytes>) {
        let mut inner = write(&self.inner);
        inner.main = Some(main.into());
        inner.archive = Some(archive.into());
    }

    /// Replace only the main document, bypassing validation.
    pub fn set_main(&self, main: impl Into<Bytes>) {
        write(&self.inner).main = Some(main.into());
    }

    /// Remove the archive document.
    pub fn remove_archive(&self) {
        write(&self.inner).archive = None;
    }

    /// Current main document, if any.
    pub fn main(&self) -> Option<Bytes> {
        read(&self.inner).main.clone()
    }

    /// Current archive document, if any.
    pub fn archive(&self) -> Option<Bytes> {
        read(&self.inner).archive.clone()
    }

    /// Number of successful writes through [`LocalStore::write_local`].
    pub fn write_count(&self) -> usize {
        read(&self.inner).writes
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn read_local(&self) -> Result<LocalSnapshot> {
        let inner = read(&self.inner);
        let main = inner.main.clone().ok_or_else(|| {
            StoreError::io(
                "memory://main",
                std::io::Error::new(ErrorKind::NotFound, "main document missing"),
            )
        })?;
        Ok(LocalSnapshot::with_default_archive(main, inner.archive.clone()))
    }

    async fn write_local(&self, main: &Bytes, archive: &Bytes) -> Result<()> {
        validate_main_document(main)?;

        let mut inner = write(&self.inner);
        inner.main = Some(main.clone());
        inner.archive = Some(archive.clone());
        inner.writes += 1;
        Ok(())
    }
}

/// In-memory metadata store.
#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    inner: Arc<RwLock<MemoryMeta>>,
}

#[derive(Default)]
struct MemoryMeta {
    metadata: SyncMetadata,
    writes: usize,
    fail_write: bool,
}

impl MemoryMetadataStore {
    /// Create a store in the never-synced state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `metadata`.
    pub fn with_metadata(metadata: SyncMetadata) -> Self {
        let store = Self::new();
        write(&store.inner).metadata = metadata;
        store
    }

    /// Current metadata.
    pub fn metadata(&self) -> SyncMetadata {
        read(&self.inner).metadata.clone()
    }

    /// Make the next `write_metadata` fail, leaving the metadata as it was.
    pub fn fail_next_write(&self) {
        write(&self.inner).fail_write = true;
    }

    /// Number of writes through [`MetadataStore::write_metadata`].
    pub fn write_count(&self) -> usize {
        read(&self.inner).writes
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn read_metadata(&self) -> Result<SyncMetadata> {
        Ok(self.metadata())
    }

    async fn write_metadata(&self, version: &VersionToken, local_hash: &Digest) -> Result<()> {
        let mut inner = write(&self.inner);
        if std::mem::take(&mut inner.fail_write) {
            return Err(StoreError::io(
                "memory://metadata",
                std::io::Error::new(ErrorKind::Other, "injected failure"),
            ));
        }
        inner.metadata = SyncMetadata::new(version.clone(), *local_hash);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_remote_core::EMPTY_COLLECTION;

    #[tokio::test]
    async fn test_empty_store_read_fails() {
        let store = MemoryLocalStore::new();
        assert!(store.read_local().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_missing_archive_defaults() {
        let store = MemoryLocalStore::new();
        store.set_main(&b"tasks: []\n"[..]);
        let snap = store.read_local().await.unwrap();
        assert_eq!(&snap.archive[..], EMPTY_COLLECTION);
    }

    #[tokio::test]
    async fn test_write_validates_marker() {
        let store = MemoryLocalStore::with_documents(&b"tasks: []\n"[..], &b"tasks: []\n"[..]);
        let err = store
            .write_local(&Bytes::from_static(b"garbage"), &Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.main().unwrap(), Bytes::from_static(b"tasks: []\n"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let meta = MemoryMetadataStore::new();
        let clone = meta.clone();
        let digest = Digest::hash(b"abc");
        clone.write_metadata(&"v9".into(), &digest).await.unwrap();
        assert_eq!(meta.metadata(), SyncMetadata::new("v9".into(), digest));
        assert_eq!(meta.write_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_metadata_failure_is_one_shot() {
        let digest = Digest::hash(b"abc");
        let meta = MemoryMetadataStore::with_metadata(SyncMetadata::new("v1".into(), digest));
        meta.fail_next_write();

        let err = meta
            .write_metadata(&"v2".into(), &Digest::hash(b"def"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(meta.metadata(), SyncMetadata::new("v1".into(), digest));
        assert_eq!(meta.write_count(), 0);

        meta.write_metadata(&"v2".into(), &digest).await.unwrap();
        assert_eq!(meta.write_count(), 1);
    }
}
