//! Advisory lock over a namespace for the duration of a sync run.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::info;

use crate::error::StoreError;

const LOCK_FILENAME: &str = ".lock";

/// RAII guard for the namespace lock file.
///
/// The lock is released when the guard is dropped. The file itself is left in
/// place so a waiting process never ends up locking a different inode.
#[derive(Debug)]
pub struct NamespaceLock {
    _file: File,
    path: PathBuf,
}

impl NamespaceLock {
    /// Acquire an exclusive lock on the namespace at `dir`, blocking if another
    /// run holds it.
    pub fn acquire(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::StorageUnavailable {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(LOCK_FILENAME);
        let file = File::create(&path)?;

        if file.try_lock_exclusive().is_err() {
            info!(path = %path.display(), "waiting for lock on schema cache");
            file.lock_exclusive()?;
        }

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
