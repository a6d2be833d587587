//! cdai CLI binary entry point.
//!
//! Parses command-line arguments with clap, initializes the tracing
//! subscriber, and dispatches to the selected subcommand via [`Cli::run`].

mod assets;
mod cli;
mod logging;
mod tui;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command, log_dir, stderr) = cli.log_context();
    let _guard = logging::init_tracing(&log_dir, command, stderr)?;

    cli.run().await
}
