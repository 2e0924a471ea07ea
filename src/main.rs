//! bta - Blob Tier Analysis Tool
//!
//! Command-line entry point: parses arguments, loads configuration and runs
//! the selected command.

use blobtier::cli::{Cli, Commands};
use blobtier::config::{load_config, load_config_no_validation};
use blobtier::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug || debug_from_env());

    // Execute the command
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    debug!("Starting bta {}", env!("CARGO_PKG_VERSION"));

    // Config commands must work even when the stored configuration is invalid
    let config = match &cli.command {
        Commands::Config { .. } => load_config_no_validation().await?,
        _ => load_config().await?,
    };

    cli.execute(config).await
}

fn debug_from_env() -> bool {
    std::env::var("DEBUG").is_ok_and(|value| value.to_lowercase() == "true" || value == "1")
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "blobtier=debug" } else { "blobtier=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
