//! Game walker: replay a parsed game and yield every position it reaches.

use shakmaty::fen::Fen;
use shakmaty::{Chess, EnPassantMode, Move, Position as _};

use fenalyzer_core::Position;

use crate::reader::ParsedGame;

/// Render a board as the canonical FEN used for keys.
///
/// The en-passant square is only written when a capture there is legal, so
/// transpositions that differ only in a dead double-step share a key.
pub fn canonical_fen(board: &Chess) -> Position {
    Position::from_canonical(Fen::from_position(board.clone(), EnPassantMode::Legal).to_string())
}

/// Replays one game. Cheap to construct; every call to
/// [`positions`](GameWalker::positions) starts again from the start position.
#[derive(Debug, Clone, Copy)]
pub struct GameWalker<'a> {
    start: &'a Chess,
    moves: &'a [Move],
}

impl<'a> GameWalker<'a> {
    pub fn new(game: &'a ParsedGame) -> Self {
        Self::from_parts(&game.start, &game.moves)
    }

    /// Walk an arbitrary start position and move list. The moves must be
    /// legal in sequence; the parser guarantees this for parsed games.
    pub fn from_parts(start: &'a Chess, moves: &'a [Move]) -> Self {
        Self { start, moves }
    }

    /// Number of positions the walk yields: moves + 1.
    pub fn len(&self) -> usize {
        self.moves.len() + 1
    }

    /// Never empty: the start position is always yielded.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Lazily yield the start position, then the position after each move.
    pub fn positions(&self) -> Positions<'a> {
        Positions {
            board: self.start.clone(),
            moves: self.moves.iter(),
            started: false,
        }
    }
}

/// Iterator returned by [`GameWalker::positions`].
pub struct Positions<'a> {
    board: Chess,
    moves: std::slice::Iter<'a, Move>,
    started: bool,
}

impl Iterator for Positions<'_> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if !self.started {
            self.started = true;
            return Some(canonical_fen(&self.board));
        }
        let mv = self.moves.next()?;
        self.board.play_unchecked(mv);
        Some(canonical_fen(&self.board))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.moves.len() + usize::from(!self.started);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Positions<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::PgnReader;
    use fenalyzer_core::STARTING_FEN;
    use proptest::prelude::*;

    fn parse(pgn: &str) -> ParsedGame {
        PgnReader::new(pgn.as_bytes()).next_game().unwrap().unwrap()
    }

    #[test]
    fn test_e4_e5_positions() {
        let game = parse("1. e4 e5 *");
        let positions: Vec<String> = GameWalker::new(&game)
            .positions()
            .map(Position::into_string)
            .collect();
        assert_eq!(
            positions,
            vec![
                STARTING_FEN.to_string(),
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
                "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_moves_yields_start_only() {
        let start = Chess::default();
        let walker = GameWalker::from_parts(&start, &[]);
        let positions: Vec<_> = walker.positions().collect();
        assert_eq!(walker.len(), 1);
        assert_eq!(positions, vec![Position::starting()]);
    }

    #[test]
    fn test_restartable() {
        let game = parse("1. d4 Nf6 2. c4 e6 *");
        let walker = GameWalker::new(&game);
        let first: Vec<_> = walker.positions().collect();
        let second: Vec<_> = walker.positions().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_legal_en_passant_square_kept() {
        let game = parse("1. e4 Nf6 2. e5 d5 *");
        let last = GameWalker::new(&game).positions().last().unwrap();
        assert_eq!(
            last.as_str(),
            "rnbqkb1r/ppp1pppp/5n2/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3"
        );
    }

    #[test]
    fn test_repetition_repeats_positions() {
        let game = parse("1. Nf3 Nf6 2. Ng1 Ng8 *");
        let positions: Vec<_> = GameWalker::new(&game).positions().collect();
        assert_eq!(positions.len(), 5);
        // Same placement, different move counters.
        assert_eq!(positions[0].board(), positions[4].board());
        assert_ne!(positions[0], positions[4]);
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let game = parse("1. e4 e5 2. Nf3 *");
        let mut it = GameWalker::new(&game).positions();
        assert_eq!(it.len(), 4);
        it.next();
        assert_eq!(it.len(), 3);
    }

    proptest! {
        #[test]
        fn test_walk_length_is_moves_plus_one(choices in prop::collection::vec(any::<prop::sample::Index>(), 0..40)) {
            let start = Chess::default();
            let mut board = start.clone();
            let mut moves = Vec::new();
            for choice in choices {
                let legal = board.legal_moves();
                if legal.is_empty() {
                    break;
                }
                let mv = legal[choice.index(legal.len())].clone();
                board.play_unchecked(&mv);
                moves.push(mv);
            }

            let walker = GameWalker::from_parts(&start, &moves);
            let positions: Vec<_> = walker.positions().collect();
            prop_assert_eq!(positions.len(), moves.len() + 1);
            prop_assert_eq!(&positions[0], &Position::starting());
        }
    }
}
