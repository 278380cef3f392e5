//! `orquestra` command-line tool
//!
//! Works on the shard log recorded by test runs: report a run, list runs,
//! clean them up, and inspect the effective configuration.

mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let source = ConfigSource::locate(cli.config.as_deref());
    tracing::debug!(source = %source, "orquestra-cli starting");

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &source, &writer).await,
        Commands::Report(args) => {
            let config = source.load().await?;
            commands::report::execute(args, &config, &writer).await
        }
        Commands::Runs => {
            let config = source.load().await?;
            commands::runs::execute(&config, &writer).await
        }
        Commands::Clean(args) => {
            let config = source.load().await?;
            commands::clean::execute(args, &config, &writer).await
        }
    }
}

/// Diagnostics go to stderr so `--output json` stays parseable.
///
/// `--log-level` wins over `RUST_LOG`; the default is `warn`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
