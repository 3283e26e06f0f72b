pub mod commands;
pub mod output;
pub mod visualize;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "seqscope",
    version,
    about = "FASTA composition statistics and sequence comparison",
    long_about = "Seqscope parses FASTA files, reports per-file composition statistics \
                  and compares the sequences of a reference file against other files \
                  by positional similarity."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE", env = "SEQSCOPE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show composition statistics for a FASTA file
    Stats(commands::stats::StatsArgs),

    /// Compare the sequences of a reference file against other files
    Compare(commands::compare::CompareArgs),
}

/// Output formats understood by every command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
