//! # Fenalyzer PGN
//!
//! Turns PGN text into the sequence of positions each game passes through.
//!
//! ## Overview
//!
//! - [`PgnReader`] streams game records out of any [`std::io::BufRead`], one
//!   at a time, resolving SAN tokens into legal moves with `shakmaty`.
//! - [`GameWalker`] replays a parsed game and yields its positions lazily:
//!   the start position followed by one position per move.
//!
//! A record that cannot be parsed is returned as a recoverable
//! [`PgnError::MalformedGame`]; the reader has already consumed it and the
//! next call continues with the following record.
//!
//! ```rust
//! use fenalyzer_pgn::{GameWalker, PgnReader};
//!
//! let pgn = "[Event \"?\"]\n\n1. e4 e5 *\n";
//! let mut reader = PgnReader::new(pgn.as_bytes());
//! let game = reader.next_game().unwrap().unwrap();
//! let positions: Vec<_> = GameWalker::new(&game).positions().collect();
//! assert_eq!(positions.len(), 3);
//! ```

pub mod error;
pub mod movetext;
pub mod reader;
pub mod walker;

pub use error::{PgnError, Result};
pub use reader::{ParsedGame, PgnReader, RawGame};
pub use walker::{GameWalker, Positions};
