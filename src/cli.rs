//! CLI argument parsing for suthing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for timing results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary table on stderr (default)
    Text,
    /// Reports and summary as JSON on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "suthing")]
#[command(version)]
#[command(about = "File conversion, deep comparison, connection configs and command timing", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a file between formats (inferred from the suffixes)
    Convert {
        input: PathBuf,
        output: PathBuf,
    },

    /// Deep-compare two files; exits with 1 when they differ
    Equals { left: PathBuf, right: PathBuf },

    /// Resolve a connection configuration from a file or url
    Connection { source: String },

    /// Time a command over one or more runs
    Time {
        /// Number of runs
        #[arg(short = 'n', long = "repeat", default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        repeat: u32,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Command to time (everything after --)
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}
