//! Cache storage abstraction.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::manifest::ConsumerIdentity;
use crate::meta::CacheEntry;

const ENTRIES_DIR: &str = "entries";
const ENTRY_EXTENSION: &str = "json";

/// Persistent entries for one consumer namespace.
pub trait CacheStore {
    /// Names of all persisted entries.
    fn list(&self) -> Result<BTreeSet<String>, StoreError>;

    /// Read one entry. Unparseable entries are reported as [`StoreError::Corrupt`].
    fn read(&self, name: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Replace an entry atomically.
    fn write(&self, name: &str, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Remove an entry. Removing an absent entry succeeds.
    fn remove(&self, name: &str) -> Result<(), StoreError>;
}

/// File-system based cache storage rooted at a namespace directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Create a store over an existing or not-yet-created namespace directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The store for `identity` under `cache_root`, without touching the disk.
    pub fn for_identity(cache_root: &Path, identity: &ConsumerIdentity) -> Self {
        Self::new(identity.namespace_dir(cache_root))
    }

    /// Create the namespace directory for `identity` under `cache_root`.
    pub fn open(cache_root: &Path, identity: &ConsumerIdentity) -> Result<Self, StoreError> {
        let store = Self::for_identity(cache_root, identity);
        let entries = store.entries_dir();
        fs::create_dir_all(&entries).map_err(|source| StoreError::StorageUnavailable {
            path: entries,
            source,
        })?;
        Ok(store)
    }

    /// The namespace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    fn entries_dir(&self) -> PathBuf {
        self.dir.join(ENTRIES_DIR)
    }

    /// Path of the entry file for `name`.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.entries_dir().join(format!("{name}.{ENTRY_EXTENSION}"))
    }

    /// Delete the whole namespace. Returns false if it did not exist.
    pub fn clean(&self) -> Result<bool, StoreError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl CacheStore for FsStore {
    fn list(&self) -> Result<BTreeSet<String>, StoreError> {
        let entries_dir = self.entries_dir();
        let read_dir = match fs::read_dir(&entries_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(source) => {
                return Err(StoreError::StorageUnavailable {
                    path: entries_dir,
                    source,
                });
            }
        };

        let mut names = BTreeSet::new();
        for entry in read_dir {
            let path = entry?.path();
            // Skips in-flight temp files, which have no extension
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Option<CacheEntry>, StoreError> {
        let content = match fs::read(self.entry_path(name)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Bytes, not a string, so invalid UTF-8 also lands in Corrupt
        let entry: CacheEntry =
            serde_json::from_slice(&content).map_err(|e| StoreError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        if entry.validator.is_empty() {
            return Err(StoreError::Corrupt {
                name: name.to_string(),
                reason: "no ETag or Last-Modified recorded".to_string(),
            });
        }
        Ok(Some(entry))
    }

    fn write(&self, name: &str, entry: &CacheEntry) -> Result<(), StoreError> {
        let entries_dir = self.entries_dir();
        let bytes = serde_json::to_vec_pretty(entry)?;

        // Write atomically using tempfile
        let mut temp = tempfile::NamedTempFile::new_in(&entries_dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(self.entry_path(name))?;

        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.entry_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
