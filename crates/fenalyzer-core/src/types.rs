//! Strong type definitions for Fenalyzer.
//!
//! Positions and keys are both strings on disk; the newtypes keep them from
//! being swapped at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// FEN of the standard initial position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A canonical board-state string (FEN).
///
/// Immutable once produced. Never empty: an empty value is rejected at
/// construction, so a stored empty string can never be mistaken for a hit.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Position(String);

impl Position {
    /// Wrap a FEN string.
    pub fn new(fen: impl Into<String>) -> Result<Self> {
        let fen = fen.into();
        if fen.trim().is_empty() {
            return Err(CoreError::InvalidPosition("empty position string".into()));
        }
        Ok(Self(fen))
    }

    /// Wrap a FEN produced by a position generator.
    ///
    /// The caller guarantees the string is a rendered board state; no
    /// validation happens here.
    pub fn from_canonical(fen: String) -> Self {
        debug_assert!(!fen.is_empty());
        Self(fen)
    }

    /// The standard initial position.
    pub fn starting() -> Self {
        Self(STARTING_FEN.to_string())
    }

    /// Get the FEN string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Piece placement field (first FEN field).
    pub fn board(&self) -> &str {
        self.field(0).unwrap_or("")
    }

    /// Side to move field, `w` or `b` for well-formed FEN.
    pub fn side_to_move(&self) -> Option<&str> {
        self.field(1)
    }

    /// Full-move number field.
    pub fn fullmove_number(&self) -> Option<u32> {
        self.field(5).and_then(|f| f.parse().ok())
    }

    fn field(&self, index: usize) -> Option<&str> {
        self.0.split_whitespace().nth(index)
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Position {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Position {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.0
    }
}

/// A content-addressed position identifier: lowercase hex, fixed length
/// for a given [`KeyScheme`](crate::KeyScheme).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    /// Build a key from a hex digest already truncated by the keyer.
    pub(crate) fn from_digest_hex(hex: String) -> Self {
        Self(hex)
    }

    /// Parse an externally supplied key.
    ///
    /// Accepts upper or lower case hex and normalizes to lower case. The
    /// length must match `expected_len` exactly.
    pub fn parse(s: &str, expected_len: usize) -> Result<Self> {
        let s = s.trim();
        if s.len() != expected_len {
            return Err(CoreError::InvalidKey {
                key: s.to_string(),
                reason: format!("expected {} hex characters, got {}", expected_len, s.len()),
            });
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidKey {
                key: s.to_string(),
                reason: "not a hex string".into(),
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Get the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in hex characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for keys built by this crate.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionKey({})", self.0)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PositionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A (key, position) pair as persisted in the positions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRecord {
    pub key: PositionKey,
    pub position: Position,
}

impl StoreRecord {
    pub fn new(key: PositionKey, position: Position) -> Self {
        Self { key, position }
    }
}
