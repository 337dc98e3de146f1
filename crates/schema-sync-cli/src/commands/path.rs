//! Path command - prints the namespace directory.

use std::path::PathBuf;

use crate::args::CacheDirArgs;
use crate::util::{manifest_path, namespace};

#[derive(clap::Args)]
pub struct Args {
    /// Manifest whose namespace to locate (default: ./package.json)
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheDirArgs,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let path = manifest_path(args.manifest);
    let (_, store) = namespace(&path, &args.cache.cache_root())?;
    println!("{}", store.dir().display());
    Ok(())
}
