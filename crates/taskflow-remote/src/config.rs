//! Configuration for the facade.

use std::path::PathBuf;

use taskflow_remote_store::{derive_archive_name, FileLocalStore};
use taskflow_remote_sync::GistConfig;

/// Default name of the main document.
pub const DEFAULT_TASKS_FILE: &str = "tasks.yaml";

/// Default name of the metadata database inside the storage directory.
pub const DEFAULT_STATE_DB: &str = "sync-state.db";

/// Where the local documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub tasks_file: String,
    /// Derived from `tasks_file` when not set.
    pub archive_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            tasks_file: DEFAULT_TASKS_FILE.to_string(),
            archive_file: None,
        }
    }
}

impl StorageConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn archive_file_name(&self) -> String {
        self.archive_file
            .clone()
            .unwrap_or_else(|| derive_archive_name(&self.tasks_file))
    }

    pub fn main_path(&self) -> PathBuf {
        self.dir.join(&self.tasks_file)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.dir.join(self.archive_file_name())
    }

    pub fn local_store(&self) -> FileLocalStore {
        FileLocalStore::new(self.main_path(), self.archive_path())
    }
}

/// `$HOME/.config/taskflow`, or `.taskflow` when no home is set.
pub fn default_storage_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join("taskflow"))
        .unwrap_or_else(|| PathBuf::from(".taskflow"))
}

/// Full configuration for [`GistSync`](crate::GistSync).
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    pub storage: StorageConfig,
    pub gist: GistConfig,
    /// Defaults to `<storage dir>/sync-state.db`.
    pub state_db: Option<PathBuf>,
}

impl RemoteConfig {
    pub fn new(storage: StorageConfig, gist: GistConfig) -> Self {
        Self {
            storage,
            gist,
            state_db: None,
        }
    }

    pub fn state_db_path(&self) -> PathBuf {
        self.state_db
            .clone()
            .unwrap_or_else(|| self.storage.dir.join(DEFAULT_STATE_DB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_name_is_derived() {
        let mut storage = StorageConfig::new("/data");
        assert_eq!(storage.archive_path(), PathBuf::from("/data/tasks.archive.yaml"));

        storage.tasks_file = "todo".to_string();
        assert_eq!(storage.archive_file_name(), "todo.archive");

        storage.archive_file = Some("done.yaml".to_string());
        assert_eq!(storage.archive_path(), PathBuf::from("/data/done.yaml"));
    }

    #[test]
    fn test_state_db_defaults_to_storage_dir() {
        let mut config = RemoteConfig::new(StorageConfig::new("/data"), GistConfig::default());
        assert_eq!(config.state_db_path(), PathBuf::from("/data/sync-state.db"));

        config.state_db = Some(PathBuf::from("/elsewhere/state.db"));
        assert_eq!(config.state_db_path(), PathBuf::from("/elsewhere/state.db"));
    }
}
