//! Sync command - brings each manifest's namespace in line with its declared schemas.

use std::path::{Path, PathBuf};

use anyhow::Context;
use schema_sync::{Manifest, SyncReport, Synchronizer};
use tracing::debug;

use crate::args::CacheArgs;
use crate::util::manifest_path;

#[derive(clap::Args)]
pub struct Args {
    /// Manifest files to synchronize, in order (default: ./package.json)
    #[arg(num_args = 0.., value_name = "MANIFEST")]
    pub manifests: Vec<PathBuf>,

    #[command(flatten)]
    pub cache: CacheArgs,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let synchronizer = Synchronizer::from_options(&args.cache.to_sync_options())?;

    let manifests = if args.manifests.is_empty() {
        vec![manifest_path(None)]
    } else {
        args.manifests
    };

    // Stop at the first failing manifest
    for path in &manifests {
        debug!(manifest = %path.display(), "loading manifest");
        let manifest = Manifest::load(path)?;
        let report = synchronizer
            .sync(&manifest)
            .with_context(|| format!("Failed to synchronize {}", path.display()))?;
        print_summary(path, &report);
    }

    Ok(())
}

fn print_summary(path: &Path, report: &SyncReport) {
    let Some(identity) = &report.identity else {
        println!("{}: no schemas declared", path.display());
        return;
    };

    println!(
        "{identity}: {} downloaded, {} up to date, {} removed",
        report.downloaded(),
        report.up_to_date(),
        report.removed()
    );
    if let Some(index_path) = &report.index_path {
        println!("  index: {}", index_path.display());
    }
}
