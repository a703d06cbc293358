//! Runtime configuration.
//!
//! Every value has a compile-time default and can be overridden through a
//! dedicated environment variable:
//!
//! | variable | field | default |
//! |---|---|---|
//! | `FENALYZER_ROOT` | `root_dir` | directory above the executable's directory |
//! | `FENALYZER_DB_PATH` | `db_path` | `<root>/data/positions.db` |
//! | `FENALYZER_COMMIT_EVERY` | `commit_every` | `50` |
//! | `FENALYZER_KEY_SCHEME` | `key_scheme` | `sha256/16` |
//! | `FENALYZER_BUSY_TIMEOUT_MS` | `busy_timeout` | `5000` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use fenalyzer_core::KeyScheme;
use fenalyzer_store::{PositionStore, SqliteOptions, SqliteStore, StoreError};
use tracing::debug;

use crate::error::{FenalyzerError, Result};

/// Games between commits during ingestion.
pub const DEFAULT_COMMIT_EVERY: usize = 50;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const DATA_DIR: &str = "data";
const DB_FILE: &str = "positions.db";

pub const ENV_ROOT: &str = "FENALYZER_ROOT";
pub const ENV_DB_PATH: &str = "FENALYZER_DB_PATH";
pub const ENV_COMMIT_EVERY: &str = "FENALYZER_COMMIT_EVERY";
pub const ENV_KEY_SCHEME: &str = "FENALYZER_KEY_SCHEME";
pub const ENV_BUSY_TIMEOUT_MS: &str = "FENALYZER_BUSY_TIMEOUT_MS";

/// Configuration shared by the pipeline, the retrieval service and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenalyzerConfig {
    /// Installation root. Relative game sources that do not exist are looked
    /// up again under this directory.
    pub root_dir: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Games between periodic commits. Always at least 1.
    pub commit_every: usize,
    /// Key derivation scheme; must match the one the store was created with.
    pub key_scheme: KeyScheme,
    /// How long to wait on another process's write lock.
    pub busy_timeout: Duration,
}

/// The directory above the one holding the running executable, or the
/// current directory when that cannot be determined.
pub fn default_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<root>/data/positions.db`.
pub fn db_path_for(root: &Path) -> PathBuf {
    root.join(DATA_DIR).join(DB_FILE)
}

impl Default for FenalyzerConfig {
    fn default() -> Self {
        Self::with_root(default_root())
    }
}

impl FenalyzerConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root_dir = root.into();
        Self {
            db_path: db_path_for(&root_dir),
            root_dir,
            commit_every: DEFAULT_COMMIT_EVERY,
            key_scheme: KeyScheme::default(),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Defaults overridden by the `FENALYZER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_ROOT) {
            Some(root) => Self::with_root(root),
            None => Self::default(),
        };

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_COMMIT_EVERY) {
            config.commit_every = parse_var(ENV_COMMIT_EVERY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_KEY_SCHEME) {
            config.key_scheme = raw.parse()?;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = Duration::from_millis(parse_var(ENV_BUSY_TIMEOUT_MS, &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn commit_every(mut self, games: usize) -> Self {
        self.commit_every = games;
        self
    }

    pub fn key_scheme(mut self, scheme: KeyScheme) -> Self {
        self.key_scheme = scheme;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Reject values no component can run with.
    pub fn validate(&self) -> Result<()> {
        if self.commit_every == 0 {
            return Err(FenalyzerError::Config(
                "commit interval must be at least 1 game".to_string(),
            ));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(FenalyzerError::Config("database path is empty".to_string()));
        }
        Ok(())
    }

    /// Open the configured database, creating it and its directory on
    /// demand, and bind it to the configured key scheme.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let store = self.connect()?;
        store.bind_key_scheme(&self.key_scheme)?;
        debug!(db = %self.db_path.display(), scheme = %self.key_scheme, "store ready");
        Ok(store)
    }

    /// Open the configured database for lookups.
    ///
    /// Fails when the store is bound to another key scheme, but never
    /// records a binding on an unbound store.
    pub fn open_store_for_reading(&self) -> Result<SqliteStore> {
        let store = self.connect()?;
        match store.key_scheme()? {
            Some(stored) if stored != self.key_scheme => {
                Err(FenalyzerError::Store(StoreError::KeySchemeMismatch {
                    stored: stored.id(),
                    requested: self.key_scheme.id(),
                }))
            }
            _ => Ok(store),
        }
    }

    fn connect(&self) -> Result<SqliteStore> {
        self.validate()?;
        let options = SqliteOptions {
            busy_timeout: self.busy_timeout,
            ..SqliteOptions::default()
        };
        Ok(SqliteStore::open_with(&self.db_path, options)?)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| FenalyzerError::Config(format!("{}={:?} is not a valid number", name, raw)))
}
