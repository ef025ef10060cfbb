//! Snapshots: the full content of both documents at one instant.

use bytes::Bytes;

use crate::canonical::hash_pair;
use crate::digest::Digest;
use crate::types::VersionToken;

/// The canonical empty-collection document.
///
/// Substituted for an archive document that does not exist locally or
/// remotely.
pub const EMPTY_COLLECTION: &[u8] = b"tasks: []\n";

/// Local content of the main and archive documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSnapshot {
    pub main: Bytes,
    pub archive: Bytes,
}

impl LocalSnapshot {
    pub fn new(main: impl Into<Bytes>, archive: impl Into<Bytes>) -> Self {
        Self {
            main: main.into(),
            archive: archive.into(),
        }
    }

    /// Snapshot with a missing archive replaced by [`EMPTY_COLLECTION`].
    pub fn with_default_archive(main: impl Into<Bytes>, archive: Option<Bytes>) -> Self {
        Self {
            main: main.into(),
            archive: archive.unwrap_or_else(|| Bytes::from_static(EMPTY_COLLECTION)),
        }
    }

    /// Digest of the canonical form.
    pub fn digest(&self) -> Digest {
        hash_pair(&self.main, &self.archive)
    }
}

/// Remote content plus the version the remote reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub main: Bytes,
    pub archive: Bytes,
    pub version: VersionToken,
}

impl RemoteSnapshot {
    pub fn new(
        main: impl Into<Bytes>,
        archive: impl Into<Bytes>,
        version: impl Into<VersionToken>,
    ) -> Self {
        Self {
            main: main.into(),
            archive: archive.into(),
            version: version.into(),
        }
    }

    /// Digest of the canonical form, comparable with [`LocalSnapshot::digest`].
    pub fn digest(&self) -> Digest {
        hash_pair(&self.main, &self.archive)
    }

    /// The documents without the version, as they would land locally.
    pub fn to_local(&self) -> LocalSnapshot {
        LocalSnapshot {
            main: self.main.clone(),
            archive: self.archive.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_archive_is_empty_collection() {
        let snap = LocalSnapshot::with_default_archive(&b"tasks: []\n"[..], None);
        assert_eq!(&snap.archive[..], EMPTY_COLLECTION);
    }

    #[test]
    fn test_local_and_remote_digests_agree() {
        let remote = RemoteSnapshot::new(&b"tasks: []\n"[..], &b"tasks: []\n"[..], "v1");
        let local = remote.to_local();
        assert_eq!(local.digest(), remote.digest());
    }

    #[test]
    fn test_version_does_not_affect_digest() {
        let a = RemoteSnapshot::new(&b"tasks: []\n"[..], &b"tasks: []\n"[..], "v1");
        let b = RemoteSnapshot::new(&b"tasks: []\n"[..], &b"tasks: []\n"[..], "v2");
        assert_eq!(a.digest(), b.digest());
    }
}
