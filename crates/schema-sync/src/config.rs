//! Synchronization options and cache root resolution.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the default cache root.
pub const CACHE_DIR_ENV: &str = "SCHEMA_SYNC_CACHE_DIR";

/// Options for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Custom cache root (overrides `$SCHEMA_SYNC_CACHE_DIR` and the platform default)
    pub cache_dir: Option<PathBuf>,
    /// Reject `http://` schema URLs
    pub require_https: bool,
    /// Maximum payload size (default: 8 MiB)
    pub max_payload_size: u64,
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connect timeout (default: 10s)
    pub connect_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cache_dir: None,
            require_https: false,
            max_payload_size: 8 * 1024 * 1024, // 8 MiB
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncOptions {
    /// The cache root these options resolve to.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Get the default cache root.
///
/// - `$SCHEMA_SYNC_CACHE_DIR` if set
/// - otherwise the platform cache directory (via `directories`) joined with `schemas`
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os(CACHE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            directories::ProjectDirs::from("dev", "schema-sync", "schema-sync")
                .map(|p| p.cache_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".cache/schema-sync"))
                .join("schemas")
        })
}
