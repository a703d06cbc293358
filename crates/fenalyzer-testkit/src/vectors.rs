//! Golden key vectors.
//!
//! Keys are derived from the UTF-8 bytes of the FEN, so these values must
//! hold on every platform and across releases. Databases written by earlier
//! tools use the same keys.

use serde::Serialize;

use fenalyzer_core::{KeyScheme, Position, PositionKeyer};

/// A FEN and the key it must hash to.
#[derive(Debug, Clone, Serialize)]
pub struct KeyVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub fen: &'static str,
    /// Key scheme id, e.g. `sha256/16`.
    pub scheme: &'static str,
    pub expected_key: &'static str,
}

impl KeyVector {
    /// Derive the key with this crate's keyer.
    pub fn compute_key(&self) -> String {
        let scheme: KeyScheme = self
            .scheme
            .parse()
            .unwrap_or_else(|e| panic!("vector {:?} has a bad scheme: {}", self.name, e));
        let position = Position::new(self.fen)
            .unwrap_or_else(|e| panic!("vector {:?} has a bad FEN: {}", self.name, e));
        PositionKeyer::new(scheme).key(&position).as_str().to_string()
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<KeyVector> {
    vec![
        KeyVector {
            name: "starting position",
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            scheme: "sha256/16",
            expected_key: "b1791d7fc9ae3d38",
        },
        KeyVector {
            name: "after 1. e4",
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            scheme: "sha256/16",
            expected_key: "7d93ad7e3a1c986e",
        },
        KeyVector {
            name: "after 1. e4 e5",
            fen: "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
            scheme: "sha256/16",
            expected_key: "abf9f14281b64137",
        },
        KeyVector {
            name: "legal en passant target",
            fen: "rnbqkb1r/ppp1pppp/5n2/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            scheme: "sha256/16",
            expected_key: "e2b735ca183712ec",
        },
        KeyVector {
            name: "empty board",
            fen: "8/8/8/8/8/8/8/8 w - - 0 1",
            scheme: "sha256/16",
            expected_key: "fd054a4e68a2e33f",
        },
        KeyVector {
            name: "starting position, 32 hex digits",
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            scheme: "sha256/32",
            expected_key: "b1791d7fc9ae3d38966568c257ffb3a0",
        },
    ]
}

/// The vectors as pretty-printed JSON, for comparison with other tools.
pub fn vectors_json() -> String {
    serde_json::to_string_pretty(&all_vectors()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for vector in all_vectors() {
            assert_eq!(vector.compute_key(), vector.expected_key, "{}", vector.name);
        }
    }

    #[test]
    fn test_truncation_is_a_prefix() {
        let vectors = all_vectors();
        let short = &vectors[0];
        let long = &vectors[5];
        assert_eq!(short.fen, long.fen);
        assert!(long.expected_key.starts_with(short.expected_key));
    }

    #[test]
    fn test_vectors_json() {
        let json: serde_json::Value = serde_json::from_str(&vectors_json()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), all_vectors().len());
        assert_eq!(json[0]["expected_key"], "b1791d7fc9ae3d38");
    }
}
