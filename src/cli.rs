// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `incbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "incbuild",
    version,
    about = "Incrementally compile a Java project, one strongly connected component at a time.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project descriptor (TOML).
    ///
    /// Default: `Incbuild.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Incbuild.toml")]
    pub project: String,

    /// Compile only this unit (and whatever it needs), plus its association.
    #[arg(long, value_name = "NAME", conflicts_with = "rebuild")]
    pub unit: Option<String>,

    /// Treat every unit as out of date and compile everything.
    #[arg(long)]
    pub rebuild: bool,

    /// Keep running and recompile as sources change.
    #[arg(long)]
    pub watch: bool,

    /// Load the project and print the compile jobs, without compiling.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `INCBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
