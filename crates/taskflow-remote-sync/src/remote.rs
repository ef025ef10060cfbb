//! Remote store abstraction.
//!
//! The remote holds the pair of documents as one versioned unit. Every
//! successful write produces a new opaque version token.

use async_trait::async_trait;
use bytes::Bytes;
use taskflow_remote_core::{RemoteSnapshot, VersionToken};

use crate::error::Result;

/// A versioned remote store for the main and archive documents.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch both documents and the current version in one exchange.
    ///
    /// A missing archive reads as the empty collection. A missing main
    /// document reads as empty bytes.
    async fn fetch(&self) -> Result<RemoteSnapshot>;

    /// Replace both documents in a single atomic update.
    ///
    /// Returns the version token of the new remote state. On failure the
    /// remote must be left as it was.
    async fn push(&self, main: &Bytes, archive: &Bytes) -> Result<VersionToken>;
}

/// An in-memory remote for testing.
///
/// Versions are issued as `v1`, `v2`, ... and the history is kept newest
/// first, like a gist revision list.
pub mod memory {
    use super::*;
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use taskflow_remote_core::EMPTY_COLLECTION;

    use crate::error::SyncError;

    #[derive(Debug, Default)]
    struct RemoteState {
        main: Bytes,
        archive: Option<Bytes>,
        history: Vec<VersionToken>,
        fail_fetch: bool,
        fail_push: bool,
        fetches: usize,
        pushes: usize,
    }

    impl RemoteState {
        fn commit(&mut self, main: Bytes, archive: Bytes) -> VersionToken {
            self.main = main;
            self.archive = Some(archive);
            let version = VersionToken::new(format!("v{}", self.history.len() + 1));
            self.history.insert(0, version.clone());
            version
        }
    }

    fn read(lock: &RwLock<RemoteState>) -> RwLockReadGuard<'_, RemoteState> {
        lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(lock: &RwLock<RemoteState>) -> RwLockWriteGuard<'_, RemoteState> {
        lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cloneable handle to a shared in-memory remote.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryRemote {
        state: Arc<RwLock<RemoteState>>,
    }

    impl MemoryRemote {
        /// A remote holding one revision (`v1`).
        pub fn new(main: impl Into<Bytes>, archive: impl Into<Bytes>) -> Self {
            let mut state = RemoteState::default();
            state.commit(main.into(), archive.into());
            Self {
                state: Arc::new(RwLock::new(state)),
            }
        }

        /// A remote with no documents and no history.
        pub fn empty() -> Self {
            Self::default()
        }

        /// Simulate another client writing to the remote.
        pub fn set_remote(
            &self,
            main: impl Into<Bytes>,
            archive: impl Into<Bytes>,
        ) -> VersionToken {
            write(&self.state).commit(main.into(), archive.into())
        }

        /// Make the next fetch fail with a network error.
        pub fn fail_next_fetch(&self) {
            write(&self.state).fail_fetch = true;
        }

        /// Make the next push fail with a network error.
        pub fn fail_next_push(&self) {
            write(&self.state).fail_push = true;
        }

        pub fn main(&self) -> Bytes {
            read(&self.state).main.clone()
        }

        pub fn archive(&self) -> Option<Bytes> {
            read(&self.state).archive.clone()
        }

        /// Current version, or the empty token if never written.
        pub fn version(&self) -> VersionToken {
            read(&self.state)
                .history
                .first()
                .cloned()
                .unwrap_or_default()
        }

        /// All versions, newest first.
        pub fn history(&self) -> Vec<VersionToken> {
            read(&self.state).history.clone()
        }

        pub fn fetch_count(&self) -> usize {
            read(&self.state).fetches
        }

        pub fn push_count(&self) -> usize {
            read(&self.state).pushes
        }
    }

    #[async_trait]
    impl RemoteStore for MemoryRemote {
        async fn fetch(&self) -> Result<RemoteSnapshot> {
            let mut state = write(&self.state);
            if std::mem::take(&mut state.fail_fetch) {
                return Err(SyncError::network("fetch", Some(502), "injected failure"));
            }
            state.fetches += 1;

            let archive = state
                .archive
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| Bytes::from_static(EMPTY_COLLECTION));
            let version = state.history.first().cloned().unwrap_or_default();
            Ok(RemoteSnapshot::new(state.main.clone(), archive, version))
        }

        async fn push(&self, main: &Bytes, archive: &Bytes) -> Result<VersionToken> {
            let mut state = write(&self.state);
            if std::mem::take(&mut state.fail_push) {
                return Err(SyncError::network("push", Some(502), "injected failure"));
            }
            state.pushes += 1;
            Ok(state.commit(main.clone(), archive.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryRemote;
    use super::*;
    use crate::error::SyncError;
    use taskflow_remote_core::EMPTY_COLLECTION;

    #[tokio::test]
    async fn test_versions_increment() {
        let remote = MemoryRemote::new(&b"tasks:\n- a\n"[..], &b"tasks: []\n"[..]);
        assert_eq!(remote.version().as_str(), "v1");

        let v2 = remote
            .push(&Bytes::from_static(b"tasks:\n- b\n"), &Bytes::from_static(b"tasks: []\n"))
            .await
            .unwrap();
        assert_eq!(v2.as_str(), "v2");

        let history: Vec<String> = remote
            .history()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect();
        assert_eq!(history, vec!["v2", "v1"]);
    }

    #[tokio::test]
    async fn test_empty_remote() {
        let remote = MemoryRemote::empty();
        let snap = remote.fetch().await.unwrap();

        assert!(snap.version.is_empty());
        assert!(snap.main.is_empty());
        assert_eq!(&snap.archive[..], EMPTY_COLLECTION);
    }

    #[tokio::test]
    async fn test_injected_failures_are_one_shot() {
        let remote = MemoryRemote::new(&b"tasks: []\n"[..], &b"tasks: []\n"[..]);

        remote.fail_next_fetch();
        assert!(matches!(
            remote.fetch().await,
            Err(SyncError::Network { op: "fetch", .. })
        ));
        assert!(remote.fetch().await.is_ok());

        remote.fail_next_push();
        let main = Bytes::from_static(b"tasks:\n- x\n");
        assert!(remote.push(&main, &main).await.is_err());
        assert_eq!(remote.version().as_str(), "v1");
        assert_eq!(remote.push_count(), 0);
    }
}
