//! Error types for Fenalyzer.

use std::path::PathBuf;

use fenalyzer_core::CoreError;
use fenalyzer_pgn::PgnError;
use fenalyzer_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Fenalyzer operations.
#[derive(Debug, Error)]
pub enum FenalyzerError {
    /// Invalid key, position or key scheme.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The game source does not exist, directly or under the base directory.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The game source exists but could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the game source failed part-way.
    #[error("reading {source_name}: {source}")]
    Read {
        source_name: String,
        #[source]
        source: PgnError,
    },

    /// A storage failure during ingestion. Aborts the run.
    #[error("storage failure while ingesting {source_name}: {source}")]
    Storage {
        source_name: String,
        #[source]
        source: StoreError,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for Fenalyzer operations.
pub type Result<T> = std::result::Result<T, FenalyzerError>;
