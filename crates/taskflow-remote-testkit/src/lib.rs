//! # Taskflow Remote Testkit
//!
//! Testing utilities for taskflow remote sync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenario vectors**: Named reconciliation cases with the decision each must take
//! - **Generators**: Proptest strategies for task documents and sync options
//! - **Fixtures**: In-memory local, metadata and remote stores wired together
//! - **Mock gist**: A localhost HTTP server speaking enough of the gist API
//!
//! ## Scenario Vectors
//!
//! ```rust
//! use taskflow_remote_testkit::vectors::verify_all_vectors;
//!
//! for (name, matched, observed) in verify_all_vectors() {
//!     println!("{name}: {matched} ({observed})");
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use taskflow_remote_testkit::fixtures::{task_document, SyncFixture};
//!
//! let fixture = SyncFixture::synced(task_document(&["write docs"]));
//! fixture.edit_local(task_document(&["write docs", "ship"]));
//! let outcome = fixture.sync().await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod mock_gist;
pub mod vectors;

pub use fixtures::{task_document, MemoryReconciler, SyncFixture};
pub use mock_gist::{MockGist, RecordedRequest};
pub use vectors::{all_vectors, verify_all_vectors, ScenarioVector};
