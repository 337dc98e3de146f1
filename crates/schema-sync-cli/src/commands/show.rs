//! Show command - prints one schema from the published index.

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use schema_sync::{ManifestLookup, SchemaRegistry};

use crate::args::CacheDirArgs;
use crate::util::load_identity;

#[derive(clap::Args)]
pub struct Args {
    /// Schema name as declared in the manifest
    pub name: String,

    /// Manifest of the consumer (default: nearest package.json above the current directory)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    #[command(flatten)]
    pub cache: CacheDirArgs,
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new(args.cache.cache_root());

    let index = match &args.manifest {
        Some(path) => {
            let (_, identity) = load_identity(path)?;
            registry.schemas(&identity)?
        }
        None => {
            let current_dir =
                std::env::current_dir().context("Failed to get current directory")?;
            registry.schemas_for(&ManifestLookup::new(current_dir))?
        }
    };

    let payload = index
        .get(&args.name)
        .ok_or_else(|| anyhow!("Schema '{}' is not in the published index", args.name))?;
    println!("{}", serde_json::to_string_pretty(payload)?);

    Ok(())
}
