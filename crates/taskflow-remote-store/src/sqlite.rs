//! SQLite implementation of the MetadataStore trait.
//!
//! Sync metadata lives in a small key-value table next to the rest of the
//! application's configuration. All operations run on a blocking thread via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use taskflow_remote_core::{Digest, SyncMetadata, VersionToken};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::MetadataStore;

/// Keys of the `sync_state` table.
pub mod keys {
    /// Remote version recorded after the last successful action.
    pub const LAST_VERSION: &str = "last_version";
    /// Hex digest of the local snapshot after the last successful action.
    pub const LAST_LOCAL_HASH: &str = "last_local_hash";
    /// Identifier of the configured remote document set.
    pub const REMOTE_ID: &str = "remote_id";
}

/// SQLite-based metadata store.
///
/// Thread-safe via internal Mutex.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMetadataStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on a blocking thread.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await?
    }

    /// Read a single key.
    pub async fn get(&self, key: &'static str) -> Result<Option<String>> {
        self.with_conn(move |conn| read_key(conn, key)).await
    }

    /// Write a single key.
    pub async fn set(&self, key: &'static str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.with_conn(move |conn| {
            write_key(conn, key, &value, now_millis())?;
            Ok(())
        })
        .await
    }

    /// The configured remote document set, if any.
    pub async fn remote_id(&self) -> Result<Option<String>> {
        Ok(self.get(keys::REMOTE_ID).await?.filter(|id| !id.is_empty()))
    }

    /// Persist the remote document set identifier.
    pub async fn set_remote_id(&self, id: &str) -> Result<()> {
        self.set(keys::REMOTE_ID, id).await
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn read_key(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT state_value FROM sync_state WHERE state_key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(StoreError::from)
}

fn write_key(conn: &Connection, key: &str, value: &str, now_ms: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_state (state_key, state_value, updated_at_ms)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(state_key) DO UPDATE SET
             state_value = excluded.state_value,
             updated_at_ms = excluded.updated_at_ms",
        params![key, value, now_ms],
    )?;
    Ok(())
}

fn parse_stored_hash(raw: Option<String>) -> Option<Digest> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match Digest::from_hex(&raw) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "ignoring unparsable stored local hash");
            None
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn read_metadata(&self) -> Result<SyncMetadata> {
        self.with_conn(|conn| {
            let version = read_key(conn, keys::LAST_VERSION)?.unwrap_or_default();
            let hash = read_key(conn, keys::LAST_LOCAL_HASH)?;
            Ok(SyncMetadata {
                last_version: VersionToken::new(version),
                last_local_hash: parse_stored_hash(hash),
            })
        })
        .await
    }

    async fn write_metadata(&self, version: &VersionToken, local_hash: &Digest) -> Result<()> {
        let version = version.as_str().to_string();
        let hash = local_hash.to_hex();

        self.with_conn(move |conn| {
            let now = now_millis();
            let tx = conn.transaction()?;
            write_key(&tx, keys::LAST_VERSION, &version, now)?;
            write_key(&tx, keys::LAST_LOCAL_HASH, &hash, now)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
