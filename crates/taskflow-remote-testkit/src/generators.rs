//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use taskflow_remote_core::{ForceMode, LocalSnapshot, SyncOptions};

/// Generate a task title.
pub fn title() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,23}".prop_map(String::from)
}

/// Generate a valid task document (always carries the collection marker).
pub fn task_document() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(title(), 0..8).prop_map(|titles| {
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        crate::fixtures::task_document(&titles)
    })
}

/// Generate arbitrary bytes that do not contain the collection marker.
pub fn invalid_document() -> impl Strategy<Value = Bytes> {
    "[a-z0-9 \n]{0,64}"
        .prop_filter("must not contain the marker", |s| !s.contains("tasks:"))
        .prop_map(Bytes::from)
}

/// Generate a local snapshot of two valid documents.
pub fn local_snapshot() -> impl Strategy<Value = LocalSnapshot> {
    (task_document(), task_document()).prop_map(|(main, archive)| LocalSnapshot::new(main, archive))
}

/// Generate a force mode.
pub fn force_mode() -> impl Strategy<Value = ForceMode> {
    prop_oneof![Just(ForceMode::Push), Just(ForceMode::Pull)]
}

/// Generate sync options, including the invalid `force` without mode.
pub fn sync_options() -> impl Strategy<Value = SyncOptions> {
    (any::<bool>(), prop::option::of(force_mode()))
        .prop_map(|(force, mode)| SyncOptions { force, mode })
}

/// Three distinct valid documents: the agreed base, a local edit and a
/// remote edit.
pub fn three_way() -> impl Strategy<Value = (Bytes, Bytes, Bytes)> {
    (task_document(), task_document(), task_document())
        .prop_filter("documents must differ", |(base, local, remote)| {
            base != local && base != remote && local != remote
        })
}
