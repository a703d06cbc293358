//! Command execution.
//!
//! Results go to `out` (stdout in the binary); logs and progress go to stderr.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use fenalyzer::core::Position;
use fenalyzer::{
    FenalyzerConfig, IngestReport, IngestionPipeline, InsertResult, PositionKeyer, ProgressSink,
    Retrieval, RetrievalService, SqliteStore,
};

use crate::cli::{Cli, Command};

/// Progress as a single status line on stderr, rewritten in place.
struct StatusLine;

impl ProgressSink for StatusLine {
    fn on_commit(&mut self, progress: &IngestReport) {
        let mut err = io::stderr().lock();
        let _ = write!(
            err,
            "\rGames: {} | Positions: {}",
            progress.games_processed, progress.positions_processed
        );
        let _ = err.flush();
    }

    fn on_finish(&mut self, report: &IngestReport) {
        if report.games_processed > 0 {
            eprintln!();
        }
    }
}

#[derive(Serialize)]
struct LookupOutput<'a> {
    key: &'a str,
    fen: &'a str,
    board: &'a str,
    side_to_move: Option<&'a str>,
}

fn lookup_json(key: &str, position: &Position) -> Result<String> {
    Ok(serde_json::to_string(&LookupOutput {
        key,
        fen: position.as_str(),
        board: position.board(),
        side_to_move: position.side_to_move(),
    })?)
}

fn open_store(config: &FenalyzerConfig) -> Result<SqliteStore> {
    config
        .open_store()
        .with_context(|| format!("opening database {}", config.db_path.display()))
}

/// Lookups never write, not even the key scheme binding.
fn open_store_for_reading(config: &FenalyzerConfig) -> Result<SqliteStore> {
    config
        .open_store_for_reading()
        .with_context(|| format!("opening database {}", config.db_path.display()))
}

/// Run one command against the configured store.
pub fn run(cli: Cli, mut config: FenalyzerConfig, out: &mut impl Write) -> Result<ExitCode> {
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    let keyer = PositionKeyer::new(config.key_scheme);

    match cli.command {
        Command::Ingest { pgn, commit_every } => {
            if let Some(n) = commit_every {
                config.commit_every = usize::try_from(n).unwrap_or(usize::MAX);
            }
            let store = open_store(&config)?;
            let mut pipeline = IngestionPipeline::from_config(&store, &config).progress(StatusLine);

            let result = if pgn == Path::new("-") {
                pipeline.ingest_reader(io::stdin().lock(), "<stdin>")
            } else {
                pipeline.ingest(&pgn)
            };
            let report =
                result.with_context(|| format!("ingesting into {}", config.db_path.display()))?;

            writeln!(
                out,
                "Done. Games: {} ({} skipped) | Positions: {} | New: {}",
                report.games_processed,
                report.games_skipped,
                report.positions_processed,
                report.positions_inserted
            )?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Save { key, fen } => {
            let store = open_store(&config)?;
            let service = RetrievalService::new(&store, keyer);
            let fen = fen.join(" ");
            match service.save(&key, &fen)? {
                InsertResult::Inserted => writeln!(out, "Saved {}", key)?,
                InsertResult::AlreadyExists => writeln!(out, "Already stored: {}", key)?,
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Get { key, json } => {
            let store = open_store_for_reading(&config)?;
            let service = RetrievalService::new(&store, keyer);
            match service.retrieve(&key)? {
                Retrieval::Found(position) => {
                    if json {
                        writeln!(out, "{}", lookup_json(&key, &position)?)?;
                    } else {
                        writeln!(out, "{}", position)?;
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Retrieval::NotFound => {
                    tracing::info!(key = %key, "not found");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Key { fen } => {
            let key = keyer.key_str(&fen.join(" "))?;
            writeln!(out, "{}", key)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Stats { json } => {
            let store = open_store_for_reading(&config)?;
            let stats = RetrievalService::new(&store, keyer).stats()?;
            if json {
                writeln!(out, "{}", serde_json::to_string(&stats)?)?;
            } else {
                writeln!(out, "Database: {}", config.db_path.display())?;
                writeln!(out, "Positions: {}", stats.records)?;
                if let Some(scheme) = stats.key_scheme {
                    writeln!(out, "Key scheme: {}", scheme)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use fenalyzer::core::STARTING_FEN;
    use fenalyzer::PositionStore;
    use fenalyzer_testkit::fixtures::OPEN_GAME;

    struct Env {
        dir: tempfile::TempDir,
    }

    impl Env {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn run(&self, args: &[&str]) -> (ExitCode, String) {
            let mut argv = vec!["fenalyzer"];
            argv.extend_from_slice(args);
            let cli = Cli::try_parse_from(argv).unwrap();
            let config = FenalyzerConfig::with_root(self.dir.path());
            let mut out = Vec::new();
            let code = run(cli, config, &mut out).unwrap();
            (code, String::from_utf8(out).unwrap())
        }
    }

    #[test]
    fn test_ingest_then_get() {
        let env = Env::new();
        let pgn = env.dir.path().join("games.pgn");
        std::fs::write(&pgn, OPEN_GAME).unwrap();

        let (code, out) = env.run(&["ingest", pgn.to_str().unwrap()]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.contains("New: 3"));

        let (code, out) = env.run(&["get", "b1791d7fc9ae3d38"]);
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(out.trim_end(), STARTING_FEN);
    }

    #[test]
    fn test_get_miss_prints_nothing() {
        let env = Env::new();
        let (code, out) = env.run(&["get", "0123456789abcdef"]);
        assert_eq!(code, ExitCode::FAILURE);
        assert!(out.is_empty());
    }

    #[test]
    fn test_save_then_get_json() {
        let env = Env::new();
        let mut args = vec!["save", "b1791d7fc9ae3d38"];
        args.extend(STARTING_FEN.split(' '));
        let (code, out) = env.run(&args);
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(out.starts_with("Saved"));

        let (_, out) = env.run(&["get", "b1791d7fc9ae3d38", "--json"]);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["fen"], STARTING_FEN);
        assert_eq!(json["board"], "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        assert_eq!(json["side_to_move"], "w");
    }

    #[test]
    fn test_key_command() {
        let env = Env::new();
        let mut args = vec!["key"];
        args.extend(STARTING_FEN.split(' '));
        let (_, out) = env.run(&args);
        assert_eq!(out.trim_end(), "b1791d7fc9ae3d38");
    }

    #[test]
    fn test_stats_json() {
        let env = Env::new();
        let (_, out) = env.run(&["stats", "--json"]);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["records"], 0);
        assert_eq!(json["key_scheme"], serde_json::Value::Null);

        let mut args = vec!["save", "b1791d7fc9ae3d38"];
        args.extend(STARTING_FEN.split(' '));
        env.run(&args);

        let (_, out) = env.run(&["stats", "--json"]);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["records"], 1);
        assert_eq!(json["key_scheme"], "sha256/16");
    }

    #[test]
    fn test_lookups_do_not_bind_key_scheme() {
        let env = Env::new();
        let (code, _) = env.run(&["get", "b1791d7fc9ae3d38"]);
        assert_eq!(code, ExitCode::FAILURE);
        env.run(&["stats"]);

        let store = SqliteStore::open(FenalyzerConfig::with_root(env.dir.path()).db_path).unwrap();
        assert_eq!(store.key_scheme().unwrap(), None);
    }

    #[test]
    fn test_missing_source_is_error() {
        let env = Env::new();
        let cli = Cli::try_parse_from(["fenalyzer", "ingest", "no/such/file.pgn"]).unwrap();
        let err = run(cli, FenalyzerConfig::with_root(env.dir.path()), &mut Vec::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("no/such/file.pgn"));
    }
}
