//! Position key derivation.
//!
//! A key is the lowercase hex digest of the position's UTF-8 bytes,
//! truncated to a fixed number of characters. Truncation trades collision
//! resistance for compact keys: two different positions sharing a key is
//! possible, and the store keeps whichever was written first.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::types::{Position, PositionKey, StoreRecord};

/// Shortest accepted key, in hex characters.
pub const MIN_KEY_LEN: usize = 8;

/// Longest accepted key: a full 256-bit digest.
pub const MAX_KEY_LEN: usize = 64;

/// Default key length, compatible with existing `positions.db` files.
pub const DEFAULT_KEY_LEN: usize = 16;

/// Hash function used for key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    fn digest_hex(&self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }
}

/// The (algorithm, length) pair keys are derived under.
///
/// Stored keys are only meaningful under the scheme that produced them, so
/// the store records the scheme id (`"sha256/16"`) and refuses to mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyScheme {
    algorithm: HashAlgorithm,
    hex_len: usize,
}

impl KeyScheme {
    /// Build a scheme, checking the length bounds.
    pub fn new(algorithm: HashAlgorithm, hex_len: usize) -> Result<Self> {
        if !(MIN_KEY_LEN..=MAX_KEY_LEN).contains(&hex_len) {
            return Err(CoreError::InvalidKeyScheme(format!(
                "{}/{} (length must be {}..={})",
                algorithm.as_str(),
                hex_len,
                MIN_KEY_LEN,
                MAX_KEY_LEN
            )));
        }
        Ok(Self { algorithm, hex_len })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn hex_len(&self) -> usize {
        self.hex_len
    }

    /// Canonical textual id, e.g. `sha256/16`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl Default for KeyScheme {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            hex_len: DEFAULT_KEY_LEN,
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.algorithm.as_str(), self.hex_len)
    }
}

impl FromStr for KeyScheme {
    type Err = CoreError;

    /// Parse `"<algorithm>/<len>"`; a bare algorithm name uses the default length.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, len) = match s.split_once('/') {
            Some((name, len)) => {
                let len = len
                    .parse::<usize>()
                    .map_err(|_| CoreError::InvalidKeyScheme(s.to_string()))?;
                (name, len)
            }
            None => (s, DEFAULT_KEY_LEN),
        };
        let algorithm = match name.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => HashAlgorithm::Sha256,
            "blake3" => HashAlgorithm::Blake3,
            _ => return Err(CoreError::InvalidKeyScheme(s.to_string())),
        };
        Self::new(algorithm, len)
    }
}

impl TryFrom<String> for KeyScheme {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<KeyScheme> for String {
    fn from(scheme: KeyScheme) -> Self {
        scheme.to_string()
    }
}

/// Derives [`PositionKey`]s from [`Position`]s. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionKeyer {
    scheme: KeyScheme,
}

impl PositionKeyer {
    pub fn new(scheme: KeyScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// Compute the key of a position.
    pub fn key(&self, position: &Position) -> PositionKey {
        let mut digest = self.scheme.algorithm.digest_hex(position.as_str().as_bytes());
        digest.truncate(self.scheme.hex_len);
        PositionKey::from_digest_hex(digest)
    }

    /// Compute the key of a raw FEN string.
    ///
    /// Fails only when the string is not a usable position (empty).
    pub fn key_str(&self, fen: &str) -> Result<PositionKey> {
        Ok(self.key(&Position::new(fen)?))
    }

    /// Pair a position with its key.
    pub fn record(&self, position: Position) -> StoreRecord {
        StoreRecord::new(self.key(&position), position)
    }

    /// Parse an externally supplied key under this keyer's scheme.
    pub fn parse_key(&self, s: &str) -> Result<PositionKey> {
        PositionKey::parse(s, self.scheme.hex_len)
    }
}
