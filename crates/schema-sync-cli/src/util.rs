use std::path::{Path, PathBuf};

use anyhow::Context;
use schema_sync::{ConsumerIdentity, FsStore, MANIFEST_FILENAME, Manifest};

/// The given manifest path, or `package.json` in the current directory.
pub fn manifest_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(MANIFEST_FILENAME))
}

/// Load a manifest and its owner identity.
pub fn load_identity(path: &Path) -> anyhow::Result<(Manifest, ConsumerIdentity)> {
    let manifest = Manifest::load(path)?;
    let identity = manifest
        .identity()
        .with_context(|| format!("Cannot determine the cache namespace for {}", path.display()))?;
    Ok((manifest, identity))
}

/// The namespace store for the manifest at `path`, without touching the disk.
pub fn namespace(path: &Path, cache_root: &Path) -> anyhow::Result<(Manifest, FsStore)> {
    let (manifest, identity) = load_identity(path)?;
    Ok((manifest, FsStore::for_identity(cache_root, &identity)))
}
