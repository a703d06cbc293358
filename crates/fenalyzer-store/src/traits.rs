//! PositionStore trait: the abstract interface for position persistence.

use fenalyzer_core::{KeyScheme, Position, PositionKey, StoreRecord};

use crate::error::Result;

/// Result of inserting a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record with this key already exists; it was left untouched.
    AlreadyExists,
}

/// Durable key → position table.
///
/// Implementations can be in-memory or SQLite. The pipeline only needs these
/// operations.
///
/// # Commit boundary
///
/// `insert_many_if_absent` stages its records in an open write transaction.
/// They are visible to this handle immediately but only become durable, and
/// visible to other readers, at [`flush`](PositionStore::flush). Dropping the
/// handle without flushing discards them. `insert_if_absent` joins the open
/// transaction when there is one and is durable on return otherwise.
pub trait PositionStore: Send + Sync {
    /// Insert a record unless its key exists. Never overwrites.
    fn insert_if_absent(&self, record: &StoreRecord) -> Result<InsertResult>;

    /// Insert every record whose key is absent; returns how many were new.
    ///
    /// Atomic per call: on error none of `records` is applied and batches
    /// staged by earlier calls are kept.
    fn insert_many_if_absent(&self, records: &[StoreRecord]) -> Result<usize>;

    /// Look up a position by key.
    fn get(&self, key: &PositionKey) -> Result<Option<Position>>;

    /// Check if a key exists.
    fn contains(&self, key: &PositionKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of stored records.
    fn count(&self) -> Result<u64>;

    /// Make staged writes durable. No-op when nothing is staged.
    fn flush(&self) -> Result<()>;

    /// Whether staged writes are waiting for a flush.
    fn has_pending(&self) -> Result<bool>;

    /// Record the key scheme on first use, or fail if the store was filled
    /// under a different one.
    fn bind_key_scheme(&self, scheme: &KeyScheme) -> Result<()>;

    /// The key scheme the store is bound to, if any.
    fn key_scheme(&self) -> Result<Option<KeyScheme>>;
}
