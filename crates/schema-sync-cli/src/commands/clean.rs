//! Clean command - removes a consumer's whole namespace.

use std::path::PathBuf;

use schema_sync::NamespaceLock;

use crate::args::CacheDirArgs;
use crate::util::{manifest_path, namespace};

#[derive(clap::Args)]
pub struct Args {
    /// Manifest whose namespace to delete (default: ./package.json)
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheDirArgs,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let path = manifest_path(args.manifest);
    let (_, store) = namespace(&path, &args.cache.cache_root())?;

    if !store.exists() {
        println!("Nothing to clean at {}", store.dir().display());
        return Ok(());
    }

    // Held until the directory is gone so a concurrent sync cannot start inside it
    let _lock = NamespaceLock::acquire(store.dir())?;

    if store.clean()? {
        println!("Removed {}", store.dir().display());
    }
    Ok(())
}
