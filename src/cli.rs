// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `qualgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "qualgate",
    version,
    about = "Execute a compliance evaluation plan and aggregate the results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the plan file (YAML).
    #[arg(long, value_name = "PATH", default_value = "qualgate.yaml")]
    pub config: String,

    /// Path the result document (YAML) is written to.
    #[arg(long, value_name = "PATH", default_value = "qualgate-result.yaml")]
    pub output: String,

    /// Shared root working directory of the run.
    ///
    /// Items get private subdirectories below it; the finalizer runs
    /// directly in it. Defaults to the current working directory.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<String>,

    /// Directory of resolved autopilot executables, prepended to `PATH`
    /// and exposed as `APPS` for every automated check.
    #[arg(long, value_name = "DIR", default_value = "")]
    pub app_dir: String,

    /// Path to a flat YAML map of input variables.
    #[arg(long, value_name = "PATH")]
    pub vars: Option<String>,

    /// Path to a flat YAML map of secrets; values are redacted from all
    /// captured output and artifacts.
    #[arg(long, value_name = "PATH")]
    pub secrets: Option<String>,

    /// Treat autopilot output-contract violations as errors instead of
    /// warnings.
    #[arg(long)]
    pub strict: bool,

    /// Per-check timeout in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 600)]
    pub timeout: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `QUALGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute any checks.
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
