//! headsmith - catalog builder and browser for HeadSmith custom heads

mod cli;
mod commands;
mod config;
mod debounce;
mod html;
mod session;
mod site;

use anyhow::Result;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with WARN level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting headsmith v{}", env!("CARGO_PKG_VERSION"));

    let cli = cli::Cli::parse();
    cli::run(cli).await
}
