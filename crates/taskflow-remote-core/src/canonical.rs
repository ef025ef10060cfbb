//! Canonical form of a two-document snapshot.
//!
//! The canonical form is `main || SEPARATOR || archive`. It is the only
//! input to the snapshot digest, so both sides of a sync hash identical byte
//! sequences into identical digests regardless of where the bytes came from.

use crate::digest::Digest;

/// Marker placed between the main and archive documents.
///
/// Task documents never contain a bare `--` line, so the boundary is
/// unambiguous for well-formed collections.
pub const SEPARATOR: &[u8] = b"\n--\n";

/// Build the canonical byte sequence for a pair of documents.
pub fn canonical_bytes(main: &[u8], archive: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(main.len() + SEPARATOR.len() + archive.len());
    buf.extend_from_slice(main);
    buf.extend_from_slice(SEPARATOR);
    buf.extend_from_slice(archive);
    buf
}

/// Digest of the canonical form of a pair of documents.
///
/// Streams the three parts into the hasher instead of materializing
/// [`canonical_bytes`].
pub fn hash_pair(main: &[u8], archive: &[u8]) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(main);
    hasher.update(SEPARATOR);
    hasher.update(archive);
    hasher.finalize().into()
}
