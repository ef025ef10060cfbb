//! # Taskflow Remote
//!
//! Keeps a local task collection (a main document plus an archive document)
//! in step with a single GitHub Gist.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskflow_remote::{GistSync, RemoteConfig, StorageConfig};
//! use taskflow_remote::core::SyncOptions;
//! use taskflow_remote::sync::GistConfig;
//!
//! async fn example() -> taskflow_remote::Result<()> {
//!     let config = RemoteConfig::new(StorageConfig::default(), GistConfig::from_env()?);
//!     let gist = GistSync::open(config)?;
//!
//!     gist.init(false).await?;
//!     let outcome = gist.sync(&SyncOptions::new()).await?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `taskflow_remote::core` - Snapshots, digests, sync metadata
//! - `taskflow_remote::store` - Local documents and the metadata database
//! - `taskflow_remote::sync` - Reconciliation engine and gist client

pub mod config;
pub mod error;
pub mod gist_sync;

pub use taskflow_remote_core as core;
pub use taskflow_remote_store as store;
pub use taskflow_remote_sync as sync;

pub use config::{default_storage_dir, RemoteConfig, StorageConfig};
pub use error::{RemoteError, Result};
pub use gist_sync::{GistSync, InitOutcome};

pub use taskflow_remote_core::{ForceMode, SyncOptions};
pub use taskflow_remote_sync::{Decision, SyncOutcome, SyncStatus};
