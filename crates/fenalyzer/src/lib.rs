//! # Fenalyzer
//!
//! A content-addressed store of chess positions.
//!
//! ## Overview
//!
//! Fenalyzer reads games in PGN, replays each one, and stores every position
//! the game passes through keyed by a hash of its FEN:
//!
//! - **Ingestion**: [`IngestionPipeline`] streams games into a store, one
//!   staged batch per game, committing every few games.
//! - **Retrieval**: [`RetrievalService`] looks positions up by key and saves
//!   single records.
//! - **Configuration**: [`FenalyzerConfig`] locates the database and sets the
//!   key scheme and commit cadence.
//!
//! ## Usage
//!
//! ```rust
//! use fenalyzer::{IngestionPipeline, Retrieval, RetrievalService};
//! use fenalyzer::core::{PositionKeyer, STARTING_FEN};
//! use fenalyzer::store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let keyer = PositionKeyer::default();
//!
//! let report = IngestionPipeline::new(&store, keyer)
//!     .ingest_reader("1. e4 e5 *".as_bytes(), "inline")
//!     .unwrap();
//! assert_eq!(report.positions_inserted, 3);
//!
//! let service = RetrievalService::new(&store, keyer);
//! match service.retrieve("b1791d7fc9ae3d38").unwrap() {
//!     Retrieval::Found(position) => assert_eq!(position.as_str(), STARTING_FEN),
//!     Retrieval::NotFound => unreachable!(),
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `fenalyzer::core` - positions, keys and key schemes
//! - `fenalyzer::pgn` - PGN reader and game walker
//! - `fenalyzer::store` - storage trait, SQLite and in-memory stores

pub mod config;
pub mod error;
pub mod ingest;
pub mod retrieve;
pub mod source;

// Re-export component crates
pub use fenalyzer_core as core;
pub use fenalyzer_pgn as pgn;
pub use fenalyzer_store as store;

pub use config::FenalyzerConfig;
pub use error::{FenalyzerError, Result};
pub use ingest::{IngestReport, IngestionPipeline, LogProgress, ProgressSink};
pub use retrieve::{Retrieval, RetrievalService, StoreStats};
pub use source::resolve_source;

pub use fenalyzer_core::{KeyScheme, Position, PositionKey, PositionKeyer};
pub use fenalyzer_store::{InsertResult, PositionStore, SqliteStore};
