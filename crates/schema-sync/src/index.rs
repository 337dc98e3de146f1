//! The published name-to-payload index.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LoadError, PublishError, StoreError};
use crate::store::{CacheStore, FsStore};

/// Filename of the published index inside a namespace directory.
pub const INDEX_FILENAME: &str = "index.json";

/// Mapping from declared schema name to payload.
///
/// Serialized as a plain JSON object, so any consumer can load it without
/// this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    schemas: IndexMap<String, Value>,
}

impl Index {
    /// Load a published index.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the index, replacing any previous content atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let dir = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "index path has no parent")
        })?;
        let bytes = serde_json::to_vec_pretty(self)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path)?;

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Schema names in manifest order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Build an index from the store, covering exactly `declared`.
///
/// Every declared name must have a readable entry; anything else in the store
/// is ignored.
pub fn build_index<'a, S>(
    store: &S,
    declared: impl IntoIterator<Item = &'a str>,
) -> Result<Index, PublishError>
where
    S: CacheStore + ?Sized,
{
    let mut schemas = IndexMap::new();
    for name in declared {
        let entry = match store.read(name) {
            Ok(Some(entry)) => entry,
            Ok(None) | Err(StoreError::Corrupt { .. }) => {
                return Err(PublishError::MissingEntry(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        schemas.insert(name.to_string(), entry.payload);
    }
    Ok(Index { schemas })
}

/// Rebuild and write the index for `declared` into the namespace.
pub fn publish<'a>(
    store: &FsStore,
    declared: impl IntoIterator<Item = &'a str>,
) -> Result<PathBuf, PublishError> {
    let index = build_index(store, declared)?;
    let path = store.dir().join(INDEX_FILENAME);
    index.save(&path)?;
    Ok(path)
}
