//! # Fenalyzer Testkit
//!
//! Testing utilities for Fenalyzer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: FENs with the keys every build must derive for them
//! - **Generators**: Proptest strategies for random legal games and their PGN
//! - **Fixtures**: Sample PGN text and throwaway stores
//!
//! ## Golden Vectors
//!
//! ```rust
//! use fenalyzer_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     assert_eq!(vector.compute_key(), vector.expected_key);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use fenalyzer_testkit::generators::random_game;
//!
//! proptest! {
//!     #[test]
//!     fn walk_has_one_more_position_than_moves(game in random_game(60)) {
//!         prop_assert_eq!(game.positions().len(), game.moves.len() + 1);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use fenalyzer_testkit::fixtures::SqliteFixture;
//! use fenalyzer_store::PositionStore;
//!
//! let fixture = SqliteFixture::new();
//! assert_eq!(fixture.store.count().unwrap(), 0);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{SqliteFixture, TestFixture};
