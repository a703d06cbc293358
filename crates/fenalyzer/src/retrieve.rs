//! Lookup by key and the single-record save path.

use serde::{Deserialize, Serialize};
use tracing::debug;

use fenalyzer_core::{KeyScheme, Position, PositionKey, PositionKeyer, StoreRecord};
use fenalyzer_store::{InsertResult, PositionStore};

use crate::error::Result;

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    Found(Position),
    NotFound,
}

impl Retrieval {
    pub fn is_found(&self) -> bool {
        matches!(self, Retrieval::Found(_))
    }

    pub fn into_option(self) -> Option<Position> {
        match self {
            Retrieval::Found(position) => Some(position),
            Retrieval::NotFound => None,
        }
    }
}

/// Store summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub records: u64,
    pub key_scheme: Option<KeyScheme>,
}

/// Reads and single writes against a [`PositionStore`].
pub struct RetrievalService<'a, S: PositionStore + ?Sized> {
    store: &'a S,
    keyer: PositionKeyer,
}

impl<'a, S: PositionStore + ?Sized> RetrievalService<'a, S> {
    pub fn new(store: &'a S, keyer: PositionKeyer) -> Self {
        Self { store, keyer }
    }

    pub fn keyer(&self) -> &PositionKeyer {
        &self.keyer
    }

    /// Look up a key given as text. A malformed key is an error, an unknown
    /// one is [`Retrieval::NotFound`].
    pub fn retrieve(&self, key: &str) -> Result<Retrieval> {
        let key = self.keyer.parse_key(key)?;
        self.retrieve_key(&key)
    }

    pub fn retrieve_key(&self, key: &PositionKey) -> Result<Retrieval> {
        Ok(match self.store.get(key)? {
            Some(position) => Retrieval::Found(position),
            None => Retrieval::NotFound,
        })
    }

    /// Store `value` under `key` unless the key is taken. The first value
    /// stored for a key is kept.
    ///
    /// The key is not checked against the value's own key.
    pub fn save(&self, key: &str, value: &str) -> Result<InsertResult> {
        let key = self.keyer.parse_key(key)?;
        let position = Position::new(value)?;
        self.save_record(StoreRecord::new(key, position))
    }

    /// Store a position under its computed key.
    pub fn save_position(&self, value: &str) -> Result<(PositionKey, InsertResult)> {
        let record = self.keyer.record(Position::new(value)?);
        let key = record.key.clone();
        let outcome = self.save_record(record)?;
        Ok((key, outcome))
    }

    fn save_record(&self, record: StoreRecord) -> Result<InsertResult> {
        self.store.bind_key_scheme(&self.keyer.scheme())?;
        let outcome = self.store.insert_if_absent(&record)?;
        self.store.flush()?;

        if outcome == InsertResult::AlreadyExists {
            if let Some(existing) = self.store.get(&record.key)? {
                if existing != record.position {
                    debug!(key = %record.key, "key already holds a different position; keeping it");
                }
            }
        }
        Ok(outcome)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            records: self.store.count()?,
            key_scheme: self.store.key_scheme()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FenalyzerError;
    use fenalyzer_core::{CoreError, STARTING_FEN};
    use fenalyzer_store::MemoryStore;

    const START_KEY: &str = "b1791d7fc9ae3d38";

    #[test]
    fn test_save_then_retrieve() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());

        assert_eq!(service.save(START_KEY, STARTING_FEN).unwrap(), InsertResult::Inserted);
        assert_eq!(
            service.retrieve(START_KEY).unwrap(),
            Retrieval::Found(Position::starting())
        );
    }

    #[test]
    fn test_unknown_key_not_found() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());
        let outcome = service.retrieve("0123456789abcdef").unwrap();
        assert_eq!(outcome, Retrieval::NotFound);
        assert!(outcome.into_option().is_none());
    }

    #[test]
    fn test_save_keeps_first_value() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());

        service.save(START_KEY, STARTING_FEN).unwrap();
        assert_eq!(
            service.save(START_KEY, "8/8/8/8/8/8/8/8 w - - 0 1").unwrap(),
            InsertResult::AlreadyExists
        );
        assert_eq!(service.retrieve(START_KEY).unwrap().into_option(), Some(Position::starting()));
    }

    #[test]
    fn test_save_is_durable() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());
        service.save(START_KEY, STARTING_FEN).unwrap();
        assert!(!store.has_pending().unwrap());
        assert_eq!(store.committed_count().unwrap(), 1);
    }

    #[test]
    fn test_save_position_computes_key() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());

        let (key, outcome) = service.save_position(STARTING_FEN).unwrap();
        assert_eq!(key.as_str(), START_KEY);
        assert_eq!(outcome, InsertResult::Inserted);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());

        assert!(matches!(
            service.retrieve("not-a-key"),
            Err(FenalyzerError::Core(CoreError::InvalidKey { .. }))
        ));
        assert!(matches!(
            service.save(START_KEY, "   "),
            Err(FenalyzerError::Core(CoreError::InvalidPosition(_)))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_stats() {
        let store = MemoryStore::new();
        let service = RetrievalService::new(&store, PositionKeyer::default());
        service.save_position(STARTING_FEN).unwrap();

        let stats = service.stats().unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.key_scheme, Some(KeyScheme::default()));
    }
}
