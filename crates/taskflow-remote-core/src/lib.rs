//! # Taskflow Remote Core
//!
//! Pure primitives for synchronizing a local task collection with a single
//! remote copy: snapshots, digests, version tokens and sync metadata.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over the two documents (main + archive) that make up a task collection.
//!
//! ## Key Types
//!
//! - [`LocalSnapshot`] / [`RemoteSnapshot`] - Contents of both documents at one instant
//! - [`Digest`] - Fixed-length fingerprint of a snapshot (Blake3)
//! - [`VersionToken`] - Opaque identifier the remote returns after each write
//! - [`SyncMetadata`] - The last point where local and remote were known to agree
//! - [`SyncOptions`] / [`ForceMode`] - Operator choices for resolving divergence
//!
//! ## Canonicalization
//!
//! A snapshot is hashed as `main || "\n--\n" || archive`. See [`canonical`] module.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod mode;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use canonical::{canonical_bytes, hash_pair, SEPARATOR};
pub use digest::Digest;
pub use error::{CoreError, ModeError, ValidationError};
pub use mode::{ForceMode, SyncOptions};
pub use snapshot::{LocalSnapshot, RemoteSnapshot, EMPTY_COLLECTION};
pub use types::{SyncMetadata, VersionToken};
pub use validation::{validate_main_document, COLLECTION_MARKER};
