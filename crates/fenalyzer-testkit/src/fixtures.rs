//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use fenalyzer_core::{Position, PositionKey, PositionKeyer};
use fenalyzer_store::{MemoryStore, SqliteStore};

/// One short game: three positions.
pub const OPEN_GAME: &str = "[Event \"Open game\"]\n[Result \"*\"]\n\n1. e4 e5 *\n";

/// A complete game with comments, NAGs and a variation.
pub const ANNOTATED_GAME: &str = r#"[Event "Casual game"]
[Site "?"]
[White "A"]
[Black "B"]
[Result "1-0"]

1. e4 {King's pawn} e5 2. Nf3 Nc6 3. Bc4 $1 Bc5 (3... Nf6 4. Ng5) 4. c3 Nf6
5. d4 exd4 6. cxd4 Bb4+ 7. Nc3 Nxe4 8. O-O Nxc3 9. bxc3 Bxc3 10. Qb3 d5
11. Bxd5 Qf6?! 12. Bxf7+ Kf8 13. Bg5 1-0
"#;

/// A record whose second move is illegal.
pub const MALFORMED_GAME: &str = "[Event \"Broken\"]\n[Result \"*\"]\n\n1. e4 Ke7 2. Nf3 *\n";

/// Two well-formed games around one malformed one.
pub fn mixed_collection() -> String {
    format!("{}\n{}\n{}", OPEN_GAME, MALFORMED_GAME, ANNOTATED_GAME)
}

/// Key of a FEN under the default scheme.
pub fn key_of(fen: &str) -> PositionKey {
    let position = Position::new(fen).unwrap_or_else(|e| panic!("bad fixture FEN {:?}: {}", fen, e));
    PositionKeyer::default().key(&position)
}

/// A memory store and the default keyer.
pub struct TestFixture {
    pub store: MemoryStore,
    pub keyer: PositionKeyer,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            keyer: PositionKeyer::default(),
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A SQLite store in a temporary directory that is removed on drop.
pub struct SqliteFixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: SqliteStore,
}

impl SqliteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("cannot create temp dir: {}", e));
        let path = dir.path().join("data").join("positions.db");
        let store = SqliteStore::open(&path).unwrap_or_else(|e| panic!("cannot open store: {}", e));
        Self { dir, path, store }
    }

    /// Open a second handle on the same database file.
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::open(&self.path).unwrap_or_else(|e| panic!("cannot reopen store: {}", e))
    }

    /// Write `contents` to a file inside the fixture's directory.
    pub fn write_file(&self, name: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("cannot create {:?}: {}", parent, e));
        }
        fs::write(&path, contents).unwrap_or_else(|e| panic!("cannot write {:?}: {}", path, e));
        path
    }
}

impl Default for SqliteFixture {
    fn default() -> Self {
        Self::new()
    }
}
