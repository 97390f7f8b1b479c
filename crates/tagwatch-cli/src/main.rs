//! Tagwatch CLI - monitors container registry repositories for tag changes.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => commands::check::execute(args).await,
        Commands::State(args) => commands::state::execute(args).await,
        Commands::Version => {
            println!("tagwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
