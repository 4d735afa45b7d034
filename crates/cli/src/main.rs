//! safetrack: command-line host for the SafeTrack cache controller.
//!
//! Each invocation opens the configured database, runs one lifecycle event
//! or inspection command, waits for background work, and prints JSON.

mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let output = commands::run(&cli).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
