//! cloudgov - governance assessment CLI
//!
//! Reads a resource inventory snapshot, runs the governance analyzers and
//! prints the assessment as JSON.

use anyhow::Result;
use clap::Parser;
use cloudgov::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for JSON output
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run(cli)
}
