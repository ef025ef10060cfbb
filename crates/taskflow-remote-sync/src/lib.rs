//! # Taskflow Remote Sync
//!
//! Reconciliation of a local task collection with one remote copy.
//!
//! ## Overview
//!
//! A reconciliation compares the current local snapshot, the current remote
//! snapshot and the metadata recorded at the last point where both agreed.
//! From that it takes exactly one action: pull, push, nothing, or report a
//! divergence. Overwriting a side that changed independently requires an
//! explicit `--force` with a mode.
//!
//! | last version | local changed | remote changed | action        |
//! |--------------|---------------|----------------|---------------|
//! | empty        | -             | -              | pull          |
//! | set          | no            | no             | none          |
//! | set          | yes           | no             | push          |
//! | set          | no            | yes            | fast-forward  |
//! | set          | yes           | yes            | diverged      |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskflow_remote_core::SyncOptions;
//! use taskflow_remote_store::{FileLocalStore, SqliteMetadataStore};
//! use taskflow_remote_sync::{GistConfig, GistRemote, Reconciler};
//!
//! async fn example() -> taskflow_remote_sync::Result<()> {
//!     let local = FileLocalStore::in_dir("/home/me/.config/taskflow", "tasks.yaml");
//!     let metadata = SqliteMetadataStore::open("/home/me/.config/taskflow/sync-state.db")?;
//!     let remote = GistRemote::new(GistConfig::from_env()?, "abc123");
//!
//!     let reconciler = Reconciler::new(local, metadata, remote);
//!     let outcome = reconciler.reconcile(&SyncOptions::new()).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod gist;
pub mod remote;
pub mod status;
pub mod wire;

pub use engine::{decide, Decision, Divergence, Reconciler, SyncOutcome};
pub use error::{Result, SyncError};
pub use gist::{GistConfig, GistRemote, DEFAULT_API_BASE, TOKEN_ENV};
pub use remote::{memory::MemoryRemote, RemoteStore};
pub use status::{inspect, SyncStatus};
