//! Error types for Fenalyzer Core.

use thiserror::Error;

/// Errors raised while validating positions, keys and key schemes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("invalid position key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid key scheme {0:?}")]
    InvalidKeyScheme(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
