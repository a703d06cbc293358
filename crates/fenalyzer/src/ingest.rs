//! The ingestion pipeline: PGN in, deduplicated position records out.
//!
//! Games are streamed one at a time. Each game's positions are keyed and
//! written as one staged batch; every `commit_every` games the store is
//! flushed and progress is reported. The final flush always runs once the
//! source is exhausted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fenalyzer_core::{PositionKeyer, StoreRecord};
use fenalyzer_pgn::{GameWalker, ParsedGame, PgnReader};
use fenalyzer_store::{PositionStore, StoreError};

use crate::config::{FenalyzerConfig, DEFAULT_COMMIT_EVERY};
use crate::error::{FenalyzerError, Result};
use crate::source::resolve_source;

/// Totals for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Games walked and written.
    pub games_processed: u64,
    /// Malformed games that were skipped.
    pub games_skipped: u64,
    /// Positions walked, repeats included.
    pub positions_processed: u64,
    /// Positions whose key was new to the store.
    pub positions_inserted: u64,
}

/// Receives progress during ingestion.
pub trait ProgressSink {
    /// Called after each periodic commit with the running totals.
    fn on_commit(&mut self, progress: &IngestReport);

    /// Called once after the final commit.
    fn on_finish(&mut self, report: &IngestReport) {
        let _ = report;
    }
}

/// Default sink: progress goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_commit(&mut self, progress: &IngestReport) {
        info!(
            "Games: {} | Positions: {}",
            progress.games_processed, progress.positions_processed
        );
    }

    fn on_finish(&mut self, report: &IngestReport) {
        info!(
            games = report.games_processed,
            skipped = report.games_skipped,
            positions = report.positions_processed,
            inserted = report.positions_inserted,
            "ingestion finished"
        );
    }
}

/// Streams games from a PGN source into a [`PositionStore`].
pub struct IngestionPipeline<'a, S: PositionStore + ?Sized> {
    store: &'a S,
    keyer: PositionKeyer,
    commit_every: u64,
    base_dir: PathBuf,
    sink: Box<dyn ProgressSink + 'a>,
}

impl<'a, S: PositionStore + ?Sized> IngestionPipeline<'a, S> {
    /// A pipeline with the default commit interval that resolves missing
    /// sources against the current directory.
    pub fn new(store: &'a S, keyer: PositionKeyer) -> Self {
        Self {
            store,
            keyer,
            commit_every: DEFAULT_COMMIT_EVERY as u64,
            base_dir: PathBuf::from("."),
            sink: Box::new(LogProgress),
        }
    }

    /// A pipeline using the configured key scheme, commit interval and
    /// root directory.
    pub fn from_config(store: &'a S, config: &FenalyzerConfig) -> Self {
        Self::new(store, PositionKeyer::new(config.key_scheme))
            .commit_every(config.commit_every)
            .base_dir(&config.root_dir)
    }

    /// Games between commits. Zero is treated as one.
    pub fn commit_every(mut self, games: usize) -> Self {
        self.commit_every = games.max(1) as u64;
        self
    }

    /// Directory a missing source path is looked up in.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn progress(mut self, sink: impl ProgressSink + 'a) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Ingest a PGN file.
    pub fn ingest(&mut self, path: impl AsRef<Path>) -> Result<IngestReport> {
        let path = resolve_source(path.as_ref(), &self.base_dir)?;
        let file = File::open(&path).map_err(|source| FenalyzerError::Open {
            path: path.clone(),
            source,
        })?;
        self.ingest_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Ingest PGN text from any buffered reader. `source_name` labels log
    /// lines and errors.
    pub fn ingest_reader<R: BufRead>(
        &mut self,
        reader: R,
        source_name: &str,
    ) -> Result<IngestReport> {
        let storage = |source: StoreError| FenalyzerError::Storage {
            source_name: source_name.to_string(),
            source,
        };

        self.store
            .bind_key_scheme(&self.keyer.scheme())
            .map_err(storage)?;

        info!(source = source_name, commit_every = self.commit_every, "ingesting");

        let mut report = IngestReport::default();
        let mut games = PgnReader::new(reader);

        loop {
            let game = match games.next_game() {
                Ok(Some(game)) => game,
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    warn!(source = source_name, error = %e, "skipping malformed game");
                    report.games_skipped += 1;
                    continue;
                }
                Err(e) => {
                    return Err(FenalyzerError::Read {
                        source_name: source_name.to_string(),
                        source: e,
                    })
                }
            };

            let records = self.records(&game);
            let inserted = self.store.insert_many_if_absent(&records).map_err(storage)?;

            report.games_processed += 1;
            report.positions_processed += records.len() as u64;
            report.positions_inserted += inserted as u64;
            debug!(
                game = game.index,
                positions = records.len(),
                inserted,
                "staged game"
            );

            if report.games_processed % self.commit_every == 0 {
                self.store.flush().map_err(storage)?;
                self.sink.on_commit(&report);
            }
        }

        self.store.flush().map_err(storage)?;
        self.sink.on_finish(&report);
        Ok(report)
    }

    fn records(&self, game: &ParsedGame) -> Vec<StoreRecord> {
        GameWalker::new(game)
            .positions()
            .map(|position| self.keyer.record(position))
            .collect()
    }
}
