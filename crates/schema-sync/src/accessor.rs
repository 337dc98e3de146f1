//! Runtime access to published indexes.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::LoadError;
use crate::index::{INDEX_FILENAME, Index};
use crate::manifest::{ConsumerIdentity, MANIFEST_FILENAME, Manifest};

/// Determines which consumer's namespace to read.
pub trait IdentityResolver {
    fn resolve(&self) -> Result<ConsumerIdentity, LoadError>;
}

impl IdentityResolver for ConsumerIdentity {
    fn resolve(&self) -> Result<ConsumerIdentity, LoadError> {
        Ok(self.clone())
    }
}

/// Resolves the identity from the nearest manifest at or above a directory.
#[derive(Debug, Clone)]
pub struct ManifestLookup {
    start: PathBuf,
}

impl ManifestLookup {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Find the nearest manifest by walking up the directory tree.
    pub fn find_manifest(&self) -> Option<PathBuf> {
        let mut current = self.start.clone();
        loop {
            let manifest_path = current.join(MANIFEST_FILENAME);
            if manifest_path.is_file() {
                return Some(manifest_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }
}

impl IdentityResolver for ManifestLookup {
    fn resolve(&self) -> Result<ConsumerIdentity, LoadError> {
        let path = self
            .find_manifest()
            .ok_or_else(|| LoadError::ManifestNotFound(self.start.clone()))?;
        debug!(manifest = %path.display(), "resolving consumer identity");
        Ok(Manifest::load(&path)?.identity()?)
    }
}

/// Loads each consumer's index at most once per process.
///
/// Repeated calls for the same identity return the same [`Arc`]; an index
/// rewritten by a later sync is not observed until a new registry is created.
#[derive(Debug)]
pub struct SchemaRegistry {
    cache_root: PathBuf,
    loaded: Mutex<HashMap<ConsumerIdentity, Arc<Index>>>,
}

impl SchemaRegistry {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// The published index for `identity`.
    pub fn schemas(&self, identity: &ConsumerIdentity) -> Result<Arc<Index>, LoadError> {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(index) = loaded.get(identity) {
            return Ok(Arc::clone(index));
        }

        let path = identity.namespace_dir(&self.cache_root).join(INDEX_FILENAME);
        let index = match Index::load(&path) {
            Ok(index) => Arc::new(index),
            Err(LoadError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotSynchronized {
                    identity: identity.clone(),
                    path,
                });
            }
            Err(e) => return Err(e),
        };
        debug!(consumer = %identity, schemas = index.len(), "loaded schema index");

        loaded.insert(identity.clone(), Arc::clone(&index));
        Ok(index)
    }

    /// The published index for whichever consumer `resolver` names.
    pub fn schemas_for(&self, resolver: &dyn IdentityResolver) -> Result<Arc<Index>, LoadError> {
        self.schemas(&resolver.resolve()?)
    }
}
