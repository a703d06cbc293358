//! SQLite implementation of the PositionStore trait.
//!
//! This is the primary storage backend for Fenalyzer. It uses rusqlite with
//! bundled SQLite. One connection per handle, guarded by a mutex.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use fenalyzer_core::{KeyScheme, Position, PositionKey, PositionKeyer, StoreRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, PositionStore};

const META_KEY_SCHEME: &str = "key_scheme";

/// Connection tunables.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// How long a statement waits on another process's lock before failing
    /// with `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Use write-ahead logging so readers see the last committed state while
    /// a writer holds its transaction open.
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }
}

/// SQLite-based store implementation.
///
/// Dropping the store closes the connection; a staged transaction that was
/// never flushed is rolled back by SQLite.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path with default options.
    ///
    /// Creates the parent directory and the file if needed, then runs
    /// migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SqliteOptions::default())
    }

    /// Open a SQLite database at the given path.
    pub fn open_with(path: impl AsRef<Path>, options: SqliteOptions) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;
        conn.busy_timeout(options.busy_timeout)?;
        if options.wal {
            let mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!(path = %path.display(), journal_mode = %mode, "opened sqlite store");
        }
        migration::migrate(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Location of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

/// Open the staged write transaction unless one is already open.
///
/// `IMMEDIATE` takes the write lock up front, so contention surfaces here
/// (after the busy timeout) rather than halfway through a batch.
fn begin_staged(conn: &Connection) -> Result<()> {
    if conn.is_autocommit() {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("began staged write transaction");
    }
    Ok(())
}

fn read_scheme(conn: &Connection) -> Result<Option<KeyScheme>> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![META_KEY_SCHEME],
            |row| row.get(0),
        )
        .optional()?;

    stored
        .map(|s| {
            s.parse::<KeyScheme>()
                .map_err(|e| StoreError::InvalidData(format!("stored key scheme: {}", e)))
        })
        .transpose()
}

impl PositionStore for SqliteStore {
    fn insert_if_absent(&self, record: &StoreRecord) -> Result<InsertResult> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO positions (hash_id, fen) VALUES (?1, ?2)",
            params![record.key.as_str(), record.position.as_str()],
        )?;

        Ok(if changed > 0 {
            InsertResult::Inserted
        } else {
            InsertResult::AlreadyExists
        })
    }

    fn insert_many_if_absent(&self, records: &[StoreRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        begin_staged(&conn)?;

        // Savepoint rolls back on drop, so an error leaves earlier batches
        // in the staged transaction untouched.
        let sp = conn.savepoint()?;
        let mut inserted = 0;
        {
            let mut stmt =
                sp.prepare_cached("INSERT OR IGNORE INTO positions (hash_id, fen) VALUES (?1, ?2)")?;
            for record in records {
                inserted += stmt.execute(params![record.key.as_str(), record.position.as_str()])?;
            }
        }
        sp.commit()?;

        debug!(records = records.len(), inserted, "staged batch");
        Ok(inserted)
    }

    fn get(&self, key: &PositionKey) -> Result<Option<Position>> {
        let conn = self.lock()?;
        let fen: Option<String> = conn
            .query_row(
                "SELECT fen FROM positions WHERE hash_id = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        fen.map(|fen| {
            Position::new(fen)
                .map_err(|e| StoreError::InvalidData(format!("record {}: {}", key, e)))
        })
        .transpose()
    }

    fn contains(&self, key: &PositionKey) -> Result<bool> {
        let conn = self.lock()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM positions WHERE hash_id = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM positions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn flush(&self) -> Result<()> {
        let conn = self.lock()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
            debug!("committed staged write transaction");
        }
        Ok(())
    }

    fn has_pending(&self) -> Result<bool> {
        Ok(!self.lock()?.is_autocommit())
    }

    fn bind_key_scheme(&self, scheme: &KeyScheme) -> Result<()> {
        let conn = self.lock()?;
        match read_scheme(&conn)? {
            Some(stored) if stored == *scheme => Ok(()),
            Some(stored) => Err(StoreError::KeySchemeMismatch {
                stored: stored.id(),
                requested: scheme.id(),
            }),
            None => {
                check_legacy_rows(&conn, scheme)?;
                conn.execute(
                    "INSERT OR IGNORE INTO store_meta (key, value) VALUES (?1, ?2)",
                    params![META_KEY_SCHEME, scheme.id()],
                )?;
                // Another process may have bound a scheme between the read and the insert.
                match read_scheme(&conn)? {
                    Some(stored) if stored != *scheme => Err(StoreError::KeySchemeMismatch {
                        stored: stored.id(),
                        requested: scheme.id(),
                    }),
                    _ => {
                        info!(scheme = %scheme, "bound key scheme");
                        Ok(())
                    }
                }
            }
        }
    }

    fn key_scheme(&self) -> Result<Option<KeyScheme>> {
        let conn = self.lock()?;
        read_scheme(&conn)
    }
}

/// Rows written before schemes were recorded were keyed with the default
/// scheme; refuse another one unless a stored key reproduces under it.
fn check_legacy_rows(conn: &Connection, scheme: &KeyScheme) -> Result<()> {
    let legacy = KeyScheme::default();
    if *scheme == legacy {
        return Ok(());
    }
    let sample: Option<(String, String)> = conn
        .query_row("SELECT hash_id, fen FROM positions LIMIT 1", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()?;
    let Some((hash_id, fen)) = sample else {
        return Ok(());
    };

    let position = Position::new(fen).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    if PositionKeyer::new(*scheme).key(&position).as_str() == hash_id {
        return Ok(());
    }
    Err(StoreError::KeySchemeMismatch {
        stored: legacy.id(),
        requested: scheme.id(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenalyzer_core::{HashAlgorithm, STARTING_FEN};

    fn record(fen: &str) -> StoreRecord {
        PositionKeyer::default().record(Position::new(fen).unwrap())
    }

    fn sample_records() -> Vec<StoreRecord> {
        vec![
            record(STARTING_FEN),
            record("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"),
            record("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"),
        ]
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::open_memory().unwrap();
        let r = record(STARTING_FEN);

        assert_eq!(store.insert_if_absent(&r).unwrap(), InsertResult::Inserted);
        assert_eq!(store.get(&r.key).unwrap(), Some(r.position.clone()));
        assert!(store.contains(&r.key).unwrap());
    }

    #[test]
    fn test_first_writer_wins() {
        let store = SqliteStore::open_memory().unwrap();
        let first = record(STARTING_FEN);
        let second = StoreRecord::new(first.key.clone(), Position::new("8/8/8/8/8/8/8/8 w - - 0 1").unwrap());

        assert_eq!(store.insert_if_absent(&first).unwrap(), InsertResult::Inserted);
        assert_eq!(store.insert_if_absent(&second).unwrap(), InsertResult::AlreadyExists);
        assert_eq!(store.get(&first.key).unwrap(), Some(first.position));
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = SqliteStore::open_memory().unwrap();
        let key = PositionKeyer::default().parse_key("0000000000000000").unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        assert!(!store.contains(&key).unwrap());
    }

    #[test]
    fn test_batch_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let batch = sample_records();

        assert_eq!(store.insert_many_if_absent(&batch).unwrap(), 3);
        store.flush().unwrap();
        assert_eq!(store.insert_many_if_absent(&batch).unwrap(), 0);
        store.flush().unwrap();
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_duplicates_within_batch_counted_once() {
        let store = SqliteStore::open_memory().unwrap();
        let r = record(STARTING_FEN);
        assert_eq!(store.insert_many_if_absent(&[r.clone(), r]).unwrap(), 1);
    }

    #[test]
    fn test_staged_batch_visible_then_flushed() {
        let store = SqliteStore::open_memory().unwrap();
        store.insert_many_if_absent(&sample_records()).unwrap();

        assert!(store.has_pending().unwrap());
        assert_eq!(store.count().unwrap(), 3);

        store.flush().unwrap();
        assert!(!store.has_pending().unwrap());
        store.flush().unwrap();
    }

    #[test]
    fn test_unflushed_batch_lost_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.db");
        let batch = sample_records();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_many_if_absent(&batch[..1]).unwrap();
            store.flush().unwrap();
            store.insert_many_if_absent(&batch[1..]).unwrap();
            // dropped without flush
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.contains(&batch[0].key).unwrap());
        assert!(!store.contains(&batch[1].key).unwrap());
    }

    #[test]
    fn test_reader_sees_last_committed_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.db");
        let batch = sample_records();

        let writer = SqliteStore::open(&path).unwrap();
        writer.insert_many_if_absent(&batch[..1]).unwrap();
        writer.flush().unwrap();
        writer.insert_many_if_absent(&batch[1..]).unwrap();

        let reader = SqliteStore::open(&path).unwrap();
        assert_eq!(reader.count().unwrap(), 1);

        writer.flush().unwrap();
        assert_eq!(reader.count().unwrap(), 3);
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("positions.db");
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn test_key_scheme_binding() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.key_scheme().unwrap(), None);

        store.bind_key_scheme(&KeyScheme::default()).unwrap();
        store.bind_key_scheme(&KeyScheme::default()).unwrap();
        assert_eq!(store.key_scheme().unwrap(), Some(KeyScheme::default()));

        let other = KeyScheme::new(HashAlgorithm::Blake3, 16).unwrap();
        assert!(matches!(
            store.bind_key_scheme(&other),
            Err(StoreError::KeySchemeMismatch { .. })
        ));
    }

    fn legacy_db(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("legacy.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE positions (hash_id TEXT PRIMARY KEY, fen TEXT NOT NULL);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO positions (hash_id, fen) VALUES (?1, ?2)",
            params!["b1791d7fc9ae3d38", STARTING_FEN],
        )
        .unwrap();
        path
    }

    #[test]
    fn test_unbound_legacy_rows_refuse_other_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(legacy_db(&dir)).unwrap();
        assert_eq!(store.key_scheme().unwrap(), None);

        let blake = KeyScheme::new(HashAlgorithm::Blake3, 16).unwrap();
        match store.bind_key_scheme(&blake) {
            Err(StoreError::KeySchemeMismatch { stored, requested }) => {
                assert_eq!(stored, "sha256/16");
                assert_eq!(requested, "blake3/16");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(store.key_scheme().unwrap(), None);

        store.bind_key_scheme(&KeyScheme::default()).unwrap();
        assert_eq!(store.key_scheme().unwrap(), Some(KeyScheme::default()));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_unbound_empty_store_accepts_any_scheme() {
        let store = SqliteStore::open_memory().unwrap();
        let blake = KeyScheme::new(HashAlgorithm::Blake3, 32).unwrap();
        store.bind_key_scheme(&blake).unwrap();
        assert_eq!(store.key_scheme().unwrap(), Some(blake));
    }
}
