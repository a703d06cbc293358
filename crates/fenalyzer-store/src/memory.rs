//! In-memory implementation of the PositionStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite,
//! including the staged-batch commit boundary, but nothing is persisted.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fenalyzer_core::{KeyScheme, Position, PositionKey, StoreRecord};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, PositionStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Durable records.
    committed: HashMap<PositionKey, Position>,

    /// Records written since the last flush.
    staged: HashMap<PositionKey, Position>,

    /// Whether a staged batch is open. Mirrors an open SQLite transaction,
    /// which stays open even when every staged insert was ignored.
    open_batch: bool,

    key_scheme: Option<KeyScheme>,
}

impl MemoryStoreInner {
    fn lookup(&self, key: &PositionKey) -> Option<&Position> {
        self.committed.get(key).or_else(|| self.staged.get(key))
    }

    fn insert(&mut self, record: &StoreRecord) -> InsertResult {
        if self.lookup(&record.key).is_some() {
            return InsertResult::AlreadyExists;
        }
        if self.open_batch {
            self.staged.insert(record.key.clone(), record.position.clone());
        } else {
            self.committed.insert(record.key.clone(), record.position.clone());
        }
        InsertResult::Inserted
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Drop staged writes, as closing a SQLite handle without flushing would.
    pub fn discard_pending(&self) -> Result<()> {
        let mut inner = self.write()?;
        inner.staged.clear();
        inner.open_batch = false;
        Ok(())
    }

    /// Number of records that have been flushed.
    pub fn committed_count(&self) -> Result<u64> {
        Ok(self.read()?.committed.len() as u64)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionStore for MemoryStore {
    fn insert_if_absent(&self, record: &StoreRecord) -> Result<InsertResult> {
        Ok(self.write()?.insert(record))
    }

    fn insert_many_if_absent(&self, records: &[StoreRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut inner = self.write()?;
        inner.open_batch = true;
        let inserted = records
            .iter()
            .filter(|record| inner.insert(record) == InsertResult::Inserted)
            .count();
        Ok(inserted)
    }

    fn get(&self, key: &PositionKey) -> Result<Option<Position>> {
        Ok(self.read()?.lookup(key).cloned())
    }

    fn count(&self) -> Result<u64> {
        let inner = self.read()?;
        Ok((inner.committed.len() + inner.staged.len()) as u64)
    }

    fn flush(&self) -> Result<()> {
        let mut inner = self.write()?;
        let staged = std::mem::take(&mut inner.staged);
        inner.committed.extend(staged);
        inner.open_batch = false;
        Ok(())
    }

    fn has_pending(&self) -> Result<bool> {
        Ok(self.read()?.open_batch)
    }

    fn bind_key_scheme(&self, scheme: &KeyScheme) -> Result<()> {
        let mut inner = self.write()?;
        match inner.key_scheme {
            Some(stored) if stored == *scheme => Ok(()),
            Some(stored) => Err(StoreError::KeySchemeMismatch {
                stored: stored.id(),
                requested: scheme.id(),
            }),
            None => {
                inner.key_scheme = Some(*scheme);
                Ok(())
            }
        }
    }

    fn key_scheme(&self) -> Result<Option<KeyScheme>> {
        Ok(self.read()?.key_scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;
    use fenalyzer_core::{HashAlgorithm, PositionKeyer, STARTING_FEN};
    use proptest::prelude::*;

    fn record(fen: &str) -> StoreRecord {
        PositionKeyer::default().record(Position::new(fen).unwrap())
    }

    #[test]
    fn test_insert_and_get() {
        let store = MemoryStore::new();
        let r = record(STARTING_FEN);

        assert_eq!(store.insert_if_absent(&r).unwrap(), InsertResult::Inserted);
        assert_eq!(store.insert_if_absent(&r).unwrap(), InsertResult::AlreadyExists);
        assert_eq!(store.get(&r.key).unwrap(), Some(r.position));
        assert_eq!(store.committed_count().unwrap(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let store = MemoryStore::new();
        let first = record(STARTING_FEN);
        let second = StoreRecord::new(first.key.clone(), Position::new("8/8/8/8/8/8/8/8 w - - 0 1").unwrap());

        store.insert_if_absent(&first).unwrap();
        assert_eq!(store.insert_if_absent(&second).unwrap(), InsertResult::AlreadyExists);
        assert_eq!(store.get(&first.key).unwrap(), Some(first.position));
    }

    #[test]
    fn test_batch_staged_until_flush() {
        let store = MemoryStore::new();
        let batch = vec![
            record(STARTING_FEN),
            record("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
        ];

        assert_eq!(store.insert_many_if_absent(&batch).unwrap(), 2);
        assert!(store.has_pending().unwrap());
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.committed_count().unwrap(), 0);

        store.flush().unwrap();
        assert!(!store.has_pending().unwrap());
        assert_eq!(store.committed_count().unwrap(), 2);
    }

    #[test]
    fn test_discard_pending_drops_staged() {
        let store = MemoryStore::new();
        let kept = record(STARTING_FEN);
        let lost = record("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");

        store.insert_many_if_absent(std::slice::from_ref(&kept)).unwrap();
        store.flush().unwrap();
        store.insert_many_if_absent(std::slice::from_ref(&lost)).unwrap();
        store.discard_pending().unwrap();

        assert!(store.contains(&kept.key).unwrap());
        assert!(!store.contains(&lost.key).unwrap());
    }

    #[test]
    fn test_batch_of_known_keys_still_pending() {
        let store = MemoryStore::new();
        let r = record(STARTING_FEN);
        store.insert_if_absent(&r).unwrap();

        assert_eq!(store.insert_many_if_absent(&[r]).unwrap(), 0);
        assert!(store.has_pending().unwrap());
    }

    #[test]
    fn test_key_scheme_binding() {
        let store = MemoryStore::new();
        store.bind_key_scheme(&KeyScheme::default()).unwrap();

        let other = KeyScheme::new(HashAlgorithm::Sha256, 32).unwrap();
        assert!(matches!(
            store.bind_key_scheme(&other),
            Err(StoreError::KeySchemeMismatch { .. })
        ));
        assert_eq!(store.key_scheme().unwrap(), Some(KeyScheme::default()));
    }

    proptest! {
        #[test]
        fn test_matches_sqlite(ops in prop::collection::vec((0usize..6, any::<bool>(), any::<bool>()), 1..40)) {
            let fens: Vec<String> = (1..=6).map(|n| format!("8/8/8/8/8/8/8/8 w - - 0 {}", n)).collect();
            let memory = MemoryStore::new();
            let sqlite = SqliteStore::open_memory().unwrap();

            for (idx, batched, flush) in ops {
                let r = record(&fens[idx]);
                if batched {
                    let a = memory.insert_many_if_absent(std::slice::from_ref(&r)).unwrap();
                    let b = sqlite.insert_many_if_absent(std::slice::from_ref(&r)).unwrap();
                    prop_assert_eq!(a, b);
                } else {
                    let a = memory.insert_if_absent(&r).unwrap();
                    let b = sqlite.insert_if_absent(&r).unwrap();
                    prop_assert_eq!(a, b);
                }
                if flush {
                    memory.flush().unwrap();
                    sqlite.flush().unwrap();
                }
                prop_assert_eq!(memory.count().unwrap(), sqlite.count().unwrap());
                prop_assert_eq!(memory.has_pending().unwrap(), sqlite.has_pending().unwrap());
            }
        }
    }
}
