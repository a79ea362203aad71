//! CLI argument definitions for the FXSD tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fxsd",
    version,
    about = "Write, inspect and dump FXSD containers",
    long_about = "Work with FXSD containers: a self-describing type catalog\n\
                  followed by a stream of framed records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Write the sample records to a container, then read them back.
    Demo(DemoArgs),

    /// Show the type catalog and first record of a container.
    Inspect(InspectArgs),

    /// Print the 32-bit name hash of each argument.
    Hash(HashArgs),
}

#[derive(Parser)]
pub struct DemoArgs {
    /// Container file to create.
    #[arg(value_name = "OUT")]
    pub out: PathBuf,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Container file to read.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print resolved descriptors as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,

    /// Also dump both sections as hex rows.
    #[arg(long = "raw")]
    pub raw: bool,
}

#[derive(Parser)]
pub struct HashArgs {
    /// Names to hash.
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
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
