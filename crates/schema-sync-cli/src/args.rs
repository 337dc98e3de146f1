//! Shared argument definitions.

use std::path::PathBuf;
use std::time::Duration;

use schema_sync::{SyncOptions, default_cache_dir};

/// Cache root selection.
///
/// Can be embedded in other command Args using `#[command(flatten)]`.
#[derive(clap::Args, Clone, Default)]
pub struct CacheDirArgs {
    /// Custom cache root (defaults to $SCHEMA_SYNC_CACHE_DIR, then the platform cache directory)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

impl CacheDirArgs {
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Arguments for commands that talk to schema servers.
#[derive(clap::Args, Clone, Default)]
pub struct CacheArgs {
    #[command(flatten)]
    pub dir: CacheDirArgs,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Reject schema URLs that do not use HTTPS
    #[arg(long)]
    pub require_https: bool,
}

impl CacheArgs {
    /// Build SyncOptions from command-line arguments.
    pub fn to_sync_options(&self) -> SyncOptions {
        let defaults = SyncOptions::default();
        SyncOptions {
            cache_dir: self.dir.cache_dir.clone(),
            require_https: self.require_https,
            timeout: self
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}
