use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Command};

#[tokio::main]
async fn main() {
    // Load .env file if present, before clap reads BIZSEED_* fallbacks
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let catalog = cli.catalog.as_deref();
    let result = match &cli.command {
        Command::Domains => commands::domains::run(catalog),
        Command::Schema(args) => commands::schema::run(args, catalog),
        Command::Graph(args) => commands::graph::run(args, catalog),
        Command::Generate(args) => commands::generate::run(args, catalog).await,
        Command::Verify(args) => commands::verify::run(args, catalog).await,
        Command::Inspect(args) => commands::inspect::run(args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
