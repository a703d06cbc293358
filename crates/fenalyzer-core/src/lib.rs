//! # Fenalyzer Core
//!
//! Pure primitives for Fenalyzer: positions, position keys and the key
//! derivation scheme.
//!
//! This crate contains no I/O, no storage, no chess rules. A [`Position`] is
//! an opaque canonical FEN string here; producing one from a game is the job
//! of `fenalyzer-pgn`.
//!
//! ## Key Types
//!
//! - [`Position`] - Canonical FEN string of a board state
//! - [`PositionKey`] - Content-addressed identifier (truncated hash, hex)
//! - [`KeyScheme`] - Hash algorithm plus truncation length
//! - [`PositionKeyer`] - Derives keys from positions under a scheme
//! - [`StoreRecord`] - A (key, position) pair as persisted
//!
//! ## Key derivation
//!
//! ```rust
//! use fenalyzer_core::{Position, PositionKeyer};
//!
//! let keyer = PositionKeyer::default();
//! let key = keyer.key(&Position::starting());
//! assert_eq!(key.as_str(), "b1791d7fc9ae3d38");
//! ```

pub mod error;
pub mod keyer;
pub mod types;

pub use error::{CoreError, Result};
pub use keyer::{HashAlgorithm, KeyScheme, PositionKeyer};
pub use types::{Position, PositionKey, StoreRecord, STARTING_FEN};
