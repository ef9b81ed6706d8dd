// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `torchbear`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "torchbear",
    version,
    about = "Run a pipeline of dependent targets, driven by events.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline definition (TOML).
    #[arg(long, value_name = "PATH", default_value = "torchbear.toml")]
    pub config: String,

    /// Target to run; defaults to the pipeline's default target.
    ///
    /// Its dependencies are triggered and run first.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TORCHBEAR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the targets, but don't run any steps.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
