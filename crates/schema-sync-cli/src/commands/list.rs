//! List command - shows cached entries and their validators.

use std::path::PathBuf;

use schema_sync::{CacheStore, StoreError};

use crate::args::CacheDirArgs;
use crate::util::{manifest_path, namespace};

#[derive(clap::Args)]
pub struct Args {
    /// Manifest whose namespace to list (default: ./package.json)
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheDirArgs,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let path = manifest_path(args.manifest);
    let (manifest, store) = namespace(&path, &args.cache.cache_root())?;

    let names = store.list()?;
    if names.is_empty() {
        println!("No cached schemas in {}.", store.dir().display());
        return Ok(());
    }

    println!(
        "{:<24} {:<24} {:<31} {:>17}",
        "NAME", "ETAG", "LAST MODIFIED", "FETCHED"
    );
    println!("{}", "-".repeat(99));

    let declared = manifest.schemas();
    for name in &names {
        let undeclared = !declared.is_some_and(|schemas| schemas.contains_key(name));
        let marker = if undeclared { " (undeclared)" } else { "" };

        match store.read(name) {
            Ok(Some(entry)) => println!(
                "{:<24} {:<24} {:<31} {:>17}{marker}",
                name,
                entry.validator.etag.as_deref().unwrap_or("-"),
                entry.validator.last_modified.as_deref().unwrap_or("-"),
                entry.fetched_at.format("%Y-%m-%d %H:%M"),
            ),
            Ok(None) => {}
            Err(StoreError::Corrupt { reason, .. }) => {
                println!("{name:<24} (corrupt: {reason}){marker}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("{}", "-".repeat(99));
    println!("{} entries in {}", names.len(), store.dir().display());

    Ok(())
}
