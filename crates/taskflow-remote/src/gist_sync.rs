//! `GistSync`: file storage, SQLite metadata and the gist client wired
//! together.

use std::fmt;

use taskflow_remote_core::{SyncOptions, VersionToken};
use taskflow_remote_store::{FileLocalStore, LocalStore, SqliteMetadataStore};
use taskflow_remote_sync::{
    inspect, GistRemote, Reconciler, RemoteStore, SyncOutcome, SyncStatus,
};
use tracing::info;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};

/// Result of [`GistSync::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(String),
    AlreadyConfigured(String),
}

impl InitOutcome {
    pub fn gist_id(&self) -> &str {
        match self {
            InitOutcome::Created(id) | InitOutcome::AlreadyConfigured(id) => id,
        }
    }
}

impl fmt::Display for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitOutcome::Created(id) => write!(f, "Created gist {id} and stored in config."),
            InitOutcome::AlreadyConfigured(id) => write!(f, "Gist already configured: {id}"),
        }
    }
}

/// Synchronizes the local task collection with one gist.
pub struct GistSync {
    config: RemoteConfig,
    local: FileLocalStore,
    metadata: SqliteMetadataStore,
}

impl GistSync {
    /// Open local storage and the metadata database.
    ///
    /// Creates the storage directory if needed. Does not touch the network.
    pub fn open(config: RemoteConfig) -> Result<Self> {
        let state_db = config.state_db_path();
        for dir in [Some(config.storage.dir.as_path()), state_db.parent()]
            .into_iter()
            .flatten()
            .filter(|d| !d.as_os_str().is_empty())
        {
            std::fs::create_dir_all(dir).map_err(|source| RemoteError::Setup {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let metadata = SqliteMetadataStore::open(&state_db)?;
        let local = config.storage.local_store();
        Ok(Self {
            config,
            local,
            metadata,
        })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn local(&self) -> &FileLocalStore {
        &self.local
    }

    pub fn metadata(&self) -> &SqliteMetadataStore {
        &self.metadata
    }

    /// The stored gist id, if any.
    pub async fn gist_id(&self) -> Result<Option<String>> {
        Ok(self.metadata.remote_id().await?)
    }

    async fn remote(&self) -> Result<GistRemote> {
        let id = self.gist_id().await?.ok_or(RemoteError::NotConfigured)?;
        Ok(GistRemote::new(self.config.gist.clone(), id))
    }

    /// Create a gist seeded with empty collections and store its id.
    ///
    /// Does nothing if a gist is already configured.
    pub async fn init(&self, public: bool) -> Result<InitOutcome> {
        if let Some(id) = self.gist_id().await? {
            return Ok(InitOutcome::AlreadyConfigured(id));
        }
        let id = GistRemote::create(&self.config.gist, public).await?;
        self.metadata.set_remote_id(&id).await?;
        Ok(InitOutcome::Created(id))
    }

    /// Compare both sides without changing either.
    pub async fn status(&self) -> Result<SyncStatus> {
        let remote = self.remote().await?;
        Ok(inspect(&self.local, &self.metadata, &remote).await?)
    }

    /// Overwrite local documents with the remote. Metadata is untouched.
    pub async fn pull(&self) -> Result<VersionToken> {
        let remote = self.remote().await?;
        let snapshot = remote.fetch().await?;
        self.local
            .write_local(&snapshot.main, &snapshot.archive)
            .await?;
        info!(version = %snapshot.version, "pulled gist");
        Ok(snapshot.version)
    }

    /// Overwrite the remote with local documents. Metadata is untouched.
    pub async fn push(&self) -> Result<VersionToken> {
        let remote = self.remote().await?;
        let snapshot = self.local.read_local().await?;
        let version = remote.push(&snapshot.main, &snapshot.archive).await?;
        info!(version = %version, "pushed gist");
        Ok(version)
    }

    /// Reconcile local and remote.
    pub async fn sync(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let remote = self.remote().await?;
        let reconciler = Reconciler::new(self.local.clone(), self.metadata.clone(), remote);
        Ok(reconciler.reconcile(options).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use taskflow_remote_sync::GistConfig;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> GistSync {
        let gist = GistConfig::default()
            .with_api_base("http://127.0.0.1:1")
            .with_token("t");
        GistSync::open(RemoteConfig::new(StorageConfig::new(dir.path()), gist)).unwrap()
    }

    #[tokio::test]
    async fn test_operations_require_gist_id() {
        let dir = TempDir::new().unwrap();
        let gist = open(&dir);

        assert!(matches!(gist.status().await, Err(RemoteError::NotConfigured)));
        assert!(matches!(gist.pull().await, Err(RemoteError::NotConfigured)));
        assert!(matches!(gist.push().await, Err(RemoteError::NotConfigured)));
        assert!(matches!(
            gist.sync(&SyncOptions::new()).await,
            Err(RemoteError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_init_keeps_existing_id() {
        let dir = TempDir::new().unwrap();
        let gist = open(&dir);
        gist.metadata().set_remote_id("existing").await.unwrap();

        let outcome = gist.init(false).await.unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyConfigured("existing".into()));
        assert_eq!(outcome.to_string(), "Gist already configured: existing");
    }

    #[test]
    fn test_open_creates_storage_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let config = RemoteConfig::new(StorageConfig::new(&nested), GistConfig::default());

        let gist = GistSync::open(config).unwrap();
        assert!(nested.is_dir());
        assert!(nested.join("sync-state.db").exists());
        assert_eq!(gist.local().main_path(), nested.join("tasks.yaml"));
    }
}
