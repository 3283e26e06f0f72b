use clap::Parser;
use colored::*;
use seqscope::cli::{Cli, Commands};
use seqscope::SeqscopeError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins, then SEQSCOPE_LOG, then the verbosity flag
    let log_level = std::env::var("SEQSCOPE_LOG").unwrap_or_else(|_| {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
        .to_string()
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<SeqscopeError>() {
            Some(SeqscopeError::Config(_)) => 2,
            Some(SeqscopeError::Io(_)) => 3,
            Some(SeqscopeError::Parse(_)) => 4,
            Some(err) if err.is_precondition() => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .map_err(|e| SeqscopeError::Config(format!("Failed to initialize thread pool: {}", e)))?;
    }

    let config = seqscope::config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Stats(args) => seqscope::cli::commands::stats::run(args, &config),
        Commands::Compare(args) => seqscope::cli::commands::compare::run(args, &config),
    }
}
