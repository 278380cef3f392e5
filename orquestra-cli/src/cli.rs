//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Orquestra -- inspect, report, and clean recorded test runs.
///
/// Use `orquestra <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "orquestra", version, about, long_about = None)]
pub struct Cli {
    /// Path to the orquestra.toml configuration file.
    ///
    /// When omitted, `orquestra.toml` in the current directory is used if it
    /// exists; otherwise defaults plus environment overrides apply.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fold the events of a run and print the feature/scenario/step tree.
    Report(ReportArgs),

    /// List recorded runs under the shard root.
    Runs,

    /// Delete recorded events.
    Clean(CleanArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- report ----

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Run to report (default: configured run id, then the run id environment variable).
    #[arg(long)]
    pub run_id: Option<String>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

// ---- clean ----

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct CleanArgs {
    /// Delete a single run.
    #[arg(long)]
    pub run_id: Option<String>,

    /// Delete the whole shard root.
    #[arg(long)]
    pub all: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, shard, bootstrap, reporter).
        section: Option<String>,
    },
}
