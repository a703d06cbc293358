//! # Fenalyzer Store
//!
//! Storage abstraction for Fenalyzer. Provides a trait-based interface for
//! position persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store maps a [`PositionKey`](fenalyzer_core::PositionKey) to the FEN
//! it was derived from. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`PositionStore`] - The trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a single record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fenalyzer_core::{Position, PositionKeyer};
//! use fenalyzer_store::{InsertResult, PositionStore, SqliteStore};
//!
//! let store = SqliteStore::open("data/positions.db").unwrap();
//! let record = PositionKeyer::default().record(Position::starting());
//!
//! assert_eq!(store.insert_if_absent(&record).unwrap(), InsertResult::Inserted);
//! assert_eq!(store.get(&record.key).unwrap(), Some(record.position));
//! ```
//!
//! ## Design Notes
//!
//! - **First writer wins**: inserting an existing key is a no-op that reports
//!   `AlreadyExists`, even when the value differs.
//! - **Staged batches**: `insert_many_if_absent` writes into an open
//!   transaction that only becomes durable at `flush()`.
//! - **Scheme binding**: the store remembers which key scheme filled it.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteOptions, SqliteStore};
pub use traits::{InsertResult, PositionStore};
