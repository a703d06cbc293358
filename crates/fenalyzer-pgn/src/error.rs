//! Error types for PGN reading.

use thiserror::Error;

/// Errors produced while reading PGN.
#[derive(Debug, Error)]
pub enum PgnError {
    /// One game record could not be turned into a move list. The reader has
    /// consumed the record; the next call continues with the following one.
    #[error("malformed game #{index} (line {line}): {reason}")]
    MalformedGame {
        index: usize,
        line: usize,
        reason: String,
    },

    /// Reading the underlying source failed. Not recoverable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PgnError {
    /// Whether ingestion may skip this error and continue with the next game.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PgnError::MalformedGame { .. })
    }
}

/// Result type for PGN operations.
pub type Result<T> = std::result::Result<T, PgnError>;
