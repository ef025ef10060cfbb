//! File-backed local documents.
//!
//! Layout, for a tasks file named `tasks.yaml`:
//!
//! ```text
//! <storage dir>/
//! ├─ tasks.yaml            # main document
//! └─ tasks.archive.yaml    # archive document (optional)
//! ```
//!
//! Writes are staged: both documents go to `*.tmp` siblings and are synced
//! before either is renamed into place, so a failure while writing leaves the
//! previous documents untouched.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use taskflow_remote_core::{validate_main_document, LocalSnapshot};

use crate::error::{Result, StoreError};
use crate::traits::LocalStore;

/// Suffix of the staging file written next to each document.
const STAGING_SUFFIX: &str = ".tmp";

/// Derive the archive file name from the tasks file name.
///
/// `name.ext` becomes `name.archive.ext`; a name without an extension gets
/// `.archive` appended.
pub fn derive_archive_name(tasks_file: &str) -> String {
    match tasks_file.rfind('.') {
        Some(i) => format!("{}.archive{}", &tasks_file[..i], &tasks_file[i..]),
        None => format!("{}.archive", tasks_file),
    }
}

/// Local documents stored as two files.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    main_path: PathBuf,
    archive_path: PathBuf,
}

impl FileLocalStore {
    /// Create a store over the given main and archive paths.
    ///
    /// Neither file has to exist yet.
    pub fn new(main_path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            main_path: main_path.into(),
            archive_path: archive_path.into(),
        }
    }

    /// Create a store in `dir`, deriving the archive name from `tasks_file`.
    pub fn in_dir(dir: impl AsRef<Path>, tasks_file: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(tasks_file), dir.join(derive_archive_name(tasks_file)))
    }

    /// Path of the main document.
    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    /// Path of the archive document.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(STAGING_SUFFIX);
    path.with_file_name(name)
}

fn read_snapshot(main_path: &Path, archive_path: &Path) -> Result<LocalSnapshot> {
    let main = fs::read(main_path).map_err(|e| StoreError::io(main_path, e))?;

    let archive = match fs::read(archive_path) {
        Ok(bytes) => Some(Bytes::from(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(
                path = %archive_path.display(),
                "archive missing, using empty collection"
            );
            None
        }
        Err(e) => return Err(StoreError::io(archive_path, e)),
    };

    Ok(LocalSnapshot::with_default_archive(main, archive))
}

fn write_staged(path: &Path, contents: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let staged = staging_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&staged)?;
        file.write_all(contents)?;
        file.sync_all()
    };
    write().map_err(|e| {
        let _ = fs::remove_file(&staged);
        StoreError::io(&staged, e)
    })?;
    Ok(staged)
}

fn write_snapshot(
    main_path: &Path,
    archive_path: &Path,
    main: &[u8],
    archive: &[u8],
) -> Result<()> {
    validate_main_document(main)?;

    let staged_main = write_staged(main_path, main)?;
    let staged_archive = match write_staged(archive_path, archive) {
        Ok(p) => p,
        Err(e) => {
            let _ = fs::remove_file(&staged_main);
            return Err(e);
        }
    };

    fs::rename(&staged_main, main_path).map_err(|e| {
        let _ = fs::remove_file(&staged_main);
        let _ = fs::remove_file(&staged_archive);
        StoreError::io(main_path, e)
    })?;

    // Main is already replaced at this point; a failure here is surfaced, not undone.
    fs::rename(&staged_archive, archive_path).map_err(|e| {
        let _ = fs::remove_file(&staged_archive);
        StoreError::io(archive_path, e)
    })?;

    Ok(())
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn read_local(&self) -> Result<LocalSnapshot> {
        let main_path = self.main_path.clone();
        let archive_path = self.archive_path.clone();

        tokio::task::spawn_blocking(move || read_snapshot(&main_path, &archive_path)).await?
    }

    async fn write_local(&self, main: &Bytes, archive: &Bytes) -> Result<()> {
        let main_path = self.main_path.clone();
        let archive_path = self.archive_path.clone();
        let main = main.clone();
        let archive = archive.clone();

        tokio::task::spawn_blocking(move || {
            write_snapshot(&main_path, &archive_path, &main, &archive)?;
            tracing::debug!(
                main = %main_path.display(),
                archive = %archive_path.display(),
                "local documents replaced"
            );
            Ok(())
        })
        .await?
    }
}
