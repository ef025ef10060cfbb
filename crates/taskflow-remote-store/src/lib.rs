//! # Taskflow Remote Store
//!
//! Storage abstractions for the two local collaborators of a sync: the task
//! documents themselves and the sync metadata record.
//!
//! ## Overview
//!
//! The engine only talks to [`LocalStore`] and [`MetadataStore`], so it is
//! independent of where documents and metadata live. The primary
//! implementations are [`FileLocalStore`] and [`SqliteMetadataStore`], with
//! [`MemoryLocalStore`] and [`MemoryMetadataStore`] for testing.
//!
//! ## Key Types
//!
//! - [`LocalStore`] - Read/write the main + archive documents
//! - [`MetadataStore`] - Read/write the last agreement point
//! - [`FileLocalStore`] - Documents on disk, staged writes
//! - [`SqliteMetadataStore`] - Key-value metadata in SQLite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskflow_remote_store::{FileLocalStore, LocalStore, MetadataStore, SqliteMetadataStore};
//!
//! async fn example() {
//!     let local = FileLocalStore::new("tasks.yaml", "tasks.archive.yaml");
//!     let meta = SqliteMetadataStore::open("sync-state.db").unwrap();
//!
//!     let snapshot = local.read_local().await.unwrap();
//!     let last = meta.read_metadata().await.unwrap();
//!     println!("local={} last_version={}", snapshot.digest(), last.last_version);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Missing archive**: reads as the empty-collection document, never an error
//! - **Validated writes**: the main document must carry the collection marker
//! - **Paired metadata**: version and hash are written in one transaction
//! - **Absent metadata**: reads as the all-empty value

pub mod error;
pub mod files;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use files::{derive_archive_name, FileLocalStore};
pub use memory::{MemoryLocalStore, MemoryMetadataStore};
pub use sqlite::SqliteMetadataStore;
pub use traits::{LocalStore, MetadataStore};
