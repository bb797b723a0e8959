//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "devdata",
    version,
    about = "Normalize device telemetry batches",
    long_about = "Normalize a batch of insulin pump and glucose monitor records.\n\n\
                  Derives device-local times, converts glucose to mg/dL, resolves basal\n\
                  intervals, canonicalizes boluses and joins calculator records onto doses."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow glucose values and doses to appear in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize a batch file and write the result as a JSON array.
    Normalize(NormalizeArgs),

    /// List recognised record types and how each is processed.
    Types,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Batch file: a JSON array of records or one JSON record per line.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write normalized records here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Sort records by time before processing.
    #[arg(long = "sort")]
    pub sort: bool,

    /// Sort by time and log every basal truncation as a warning.
    #[arg(long = "strict")]
    pub strict: bool,

    /// Pretty-print the output JSON.
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Skip the summary table.
    #[arg(long = "no-summary")]
    pub no_summary: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
