//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fenalyzer", author, version, about = "Content-addressed store of chess positions", long_about = None)]
pub struct Cli {
    /// Database file (default: <root>/data/positions.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Store every position of every game in a PGN file ("-" reads stdin)
    Ingest {
        pgn: PathBuf,

        /// Games between commits
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        commit_every: Option<u64>,
    },

    /// Store a FEN under a key unless the key is taken
    Save {
        /// Hex key of the configured scheme's length (16 digits by default);
        /// case-insensitive, anything else is rejected
        key: String,

        /// FEN fields; joined with single spaces
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        fen: Vec<String>,
    },

    /// Print the FEN stored under a key; exits 1 when there is none
    Get {
        /// Hex key of the configured scheme's length (16 digits by default);
        /// case-insensitive, anything else is rejected
        key: String,

        /// Print a JSON object instead of the bare FEN
        #[arg(long)]
        json: bool,
    },

    /// Print the key of a FEN
    Key {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        fen: Vec<String>,
    },

    /// Print the record count and key scheme
    Stats {
        #[arg(long)]
        json: bool,
    },
}
