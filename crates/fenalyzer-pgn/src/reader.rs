//! Streaming PGN reader.
//!
//! Records are split on tag sections, blank lines after movetext and
//! termination markers. Only one record is held in memory at a time.

use std::io::BufRead;

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Move, Position as _};
use tracing::trace;

use crate::error::{PgnError, Result};
use crate::movetext::{mainline_sans, MovetextScanner};

/// One game record as split from the source, before move resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGame {
    /// 1-based index of the record within the source.
    pub index: usize,
    /// Source line where the record starts.
    pub line: usize,
    /// Tag pairs in source order.
    pub tags: Vec<(String, String)>,
    /// Movetext lines joined with `\n`.
    pub movetext: String,
    /// First tag line that could not be parsed, if any.
    bad_tag: Option<String>,
    /// First source line of the record that was not valid UTF-8.
    bad_encoding: Option<usize>,
}

impl RawGame {
    /// Look up a tag value by name (case-sensitive, first occurrence).
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn malformed(&self, reason: impl Into<String>) -> PgnError {
        PgnError::MalformedGame {
            index: self.index,
            line: self.line,
            reason: reason.into(),
        }
    }

    /// Resolve the record into a start position and legal mainline moves.
    pub fn parse(&self) -> Result<ParsedGame> {
        if let Some(line) = self.bad_encoding {
            return Err(self.malformed(format!("invalid UTF-8 on line {}", line)));
        }
        if let Some(bad) = &self.bad_tag {
            return Err(self.malformed(format!("unparseable tag line {:?}", bad)));
        }

        let castling = match self.tag("Variant").map(str::to_ascii_lowercase) {
            None => CastlingMode::Standard,
            Some(v) if matches!(v.as_str(), "" | "standard" | "chess" | "normal" | "from position") => {
                CastlingMode::Standard
            }
            Some(v) if v.contains("960") || v.contains("fischer") => CastlingMode::Chess960,
            Some(v) => return Err(self.malformed(format!("unsupported variant {:?}", v))),
        };

        let start = match self.tag("FEN") {
            Some(fen) => {
                let fen = Fen::from_ascii(fen.as_bytes())
                    .map_err(|e| self.malformed(format!("invalid FEN tag {:?}: {}", fen, e)))?;
                fen.into_position::<Chess>(castling)
                    .map_err(|e| self.malformed(format!("illegal start position: {}", e)))?
            }
            None => Chess::default(),
        };

        let mut board = start.clone();
        let mut moves = Vec::new();
        for (ply, token) in mainline_sans(&self.movetext).into_iter().enumerate() {
            let san = SanPlus::from_ascii(token.as_bytes())
                .map_err(|_| self.malformed(format!("invalid SAN {:?} at ply {}", token, ply + 1)))?;
            let mv = san
                .san
                .to_move(&board)
                .map_err(|e| self.malformed(format!("{} move {:?} at ply {}", e, token, ply + 1)))?;
            board.play_unchecked(&mv);
            moves.push(mv);
        }

        Ok(ParsedGame {
            index: self.index,
            tags: self.tags.clone(),
            start,
            moves,
        })
    }
}

/// A game with a resolved start position and legal mainline moves.
#[derive(Debug, Clone)]
pub struct ParsedGame {
    pub index: usize,
    pub tags: Vec<(String, String)>,
    pub start: Chess,
    pub moves: Vec<Move>,
}

impl ParsedGame {
    /// Look up a tag value by name.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A source line with its terminator stripped.
struct Line {
    /// Lossy decoding when the bytes were not UTF-8.
    text: String,
    utf8: bool,
}

/// Streaming reader over PGN text.
///
/// Bytes that are not UTF-8 make the enclosing record malformed; the
/// reader carries on with the next one.
pub struct PgnReader<R> {
    source: R,
    /// Line read ahead that belongs to the next record.
    pending: Option<Line>,
    line_no: usize,
    games_read: usize,
    done: bool,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            pending: None,
            line_no: 0,
            games_read: 0,
            done: false,
        }
    }

    /// Number of records split so far, malformed ones included.
    pub fn games_read(&self) -> usize {
        self.games_read
    }

    fn read_line(&mut self) -> Result<Option<Line>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = Vec::new();
        if self.source.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(match String::from_utf8(buf) {
            Ok(text) => Line { text, utf8: true },
            Err(e) => Line {
                text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                utf8: false,
            },
        }))
    }

    /// Split the next record without resolving moves.
    ///
    /// Returns `Ok(None)` at end of input.
    pub fn next_raw(&mut self) -> Result<Option<RawGame>> {
        if self.done {
            return Ok(None);
        }

        let mut game = RawGame::default();
        let mut scanner = MovetextScanner::default();
        let mut seen_tags = false;
        let mut seen_movetext = false;

        loop {
            let Some(Line { text: line, utf8 }) = self.read_line()? else {
                self.done = true;
                break;
            };
            if !seen_tags && !seen_movetext {
                game.line = self.line_no;
            }

            if seen_movetext && !scanner.in_comment() && line.trim_start().starts_with('[') {
                self.pending = Some(Line { text: line, utf8 });
                break;
            }
            let escaped = !scanner.in_comment() && line.starts_with('%');
            if !utf8 && !escaped && game.bad_encoding.is_none() {
                game.bad_encoding = Some(self.line_no);
            }

            if scanner.in_comment() {
                game.movetext.push('\n');
                game.movetext.push_str(&line);
                if scanner.feed(&line) {
                    break;
                }
                continue;
            }

            // Escape mechanism: lines starting with '%' are ignored.
            if escaped {
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                if seen_movetext && !scanner.in_variation() {
                    break;
                }
                continue;
            }

            if trimmed.starts_with('[') {
                seen_tags = true;
                match parse_tags(trimmed) {
                    Some(tags) => game.tags.extend(tags),
                    None => {
                        if game.bad_tag.is_none() {
                            game.bad_tag = Some(trimmed.to_string());
                        }
                    }
                }
                continue;
            }

            if seen_movetext {
                game.movetext.push('\n');
            }
            game.movetext.push_str(&line);
            seen_movetext = true;
            if scanner.feed(&line) {
                break;
            }
        }

        if !seen_tags && !seen_movetext {
            return Ok(None);
        }

        self.games_read += 1;
        game.index = self.games_read;
        trace!(index = game.index, line = game.line, "split game record");
        Ok(Some(game))
    }

    /// Read and resolve the next game.
    ///
    /// `Ok(None)` at end of input. A `MalformedGame` error leaves the reader
    /// positioned at the following record.
    pub fn next_game(&mut self) -> Result<Option<ParsedGame>> {
        match self.next_raw()? {
            Some(raw) => raw.parse().map(Some),
            None => Ok(None),
        }
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = Result<ParsedGame>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_game() {
            Ok(Some(game)) => Some(Ok(game)),
            Ok(None) => None,
            Err(e) => {
                if !e.is_recoverable() {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}

/// Parse a tag line holding one or more `[Name "value"]` pairs.
///
/// `None` when anything on the line is not a well-formed pair.
fn parse_tags(line: &str) -> Option<Vec<(String, String)>> {
    let mut tags = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?.trim_start();
        let name_len = inner
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());
        if name_len == 0 {
            return None;
        }
        let (name, after) = inner.split_at(name_len);
        let mut chars = after.trim_start().strip_prefix('"')?.char_indices();

        let mut value = String::new();
        let close = loop {
            match chars.next()? {
                (_, '\\') => value.push(chars.next()?.1),
                (i, '"') => break i,
                (_, c) => value.push(c),
            }
        };
        let quoted_tail = &after.trim_start()[1 + close + 1..];
        rest = quoted_tail.trim_start().strip_prefix(']')?.trim_start();
        tags.push((name.to_string(), value));
    }
    if tags.is_empty() {
        return None;
    }
    Some(tags)
}
