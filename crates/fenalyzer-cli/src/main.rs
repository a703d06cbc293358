//! Fenalyzer CLI
//!
//! Ingest PGN files into the position store and look positions up by key.

mod cli;
mod commands;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fenalyzer::FenalyzerConfig;

use crate::cli::Cli;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = FenalyzerConfig::from_env()
        .map_err(anyhow::Error::from)
        .and_then(|config| commands::run(cli, config, &mut io::stdout().lock()));

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
