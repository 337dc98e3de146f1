use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod args;
mod util;

mod commands {
    automod::dir!(pub "src/commands");
}

#[derive(Parser)]
#[command(
    name = "schema-sync",
    version,
    about = "Synchronize manifest-declared JSON schemas into a local cache"
)]
struct Cli {
    /// Log request details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch declared schemas, drop undeclared ones, and publish the index
    Sync(commands::sync::Args),
    /// List cached entries for a manifest's namespace
    List(commands::list::Args),
    /// Print one schema from the published index
    Show(commands::show::Args),
    /// Print the namespace directory for a manifest
    Path(commands::path::Args),
    /// Delete the namespace directory for a manifest
    Clean(commands::clean::Args),
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Sync(args) => commands::sync::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Show(args) => commands::show::run(args),
        Commands::Path(args) => commands::path::run(args),
        Commands::Clean(args) => commands::clean::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn setup_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("schema_sync=debug,schema_sync_cli=debug")
        } else {
            EnvFilter::new("schema_sync=info,schema_sync_cli=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
