//! Proptest generators for property-based testing.

use proptest::prelude::*;
use proptest::sample::Index;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Move, Position as _};

use fenalyzer_core::{Position, PositionKeyer, StoreRecord};
use fenalyzer_pgn::GameWalker;

/// A random legal game from the standard start position.
#[derive(Debug, Clone)]
pub struct RandomGame {
    pub start: Chess,
    pub moves: Vec<Move>,
    /// SAN of each move, check suffixes included.
    pub sans: Vec<String>,
}

impl RandomGame {
    /// Every position of the game, start first.
    pub fn positions(&self) -> Vec<Position> {
        GameWalker::from_parts(&self.start, &self.moves)
            .positions()
            .collect()
    }

    pub fn records(&self, keyer: &PositionKeyer) -> Vec<StoreRecord> {
        self.positions()
            .into_iter()
            .map(|position| keyer.record(position))
            .collect()
    }

    /// Plain movetext with move numbers, terminated by `*`.
    pub fn movetext(&self) -> String {
        self.decorated_movetext(|_, san| san.to_string())
    }

    /// A full PGN record with a small tag section.
    pub fn to_pgn(&self) -> String {
        format!("[Event \"random\"]\n[Result \"*\"]\n\n{}\n", self.movetext())
    }

    /// Movetext where each move is dressed in comments, NAGs, annotation
    /// glyphs or side variations chosen by `decorations`. The mainline is
    /// unchanged.
    pub fn annotated_movetext(&self, decorations: &[u8]) -> String {
        self.decorated_movetext(|ply, san| {
            match decorations.get(ply).copied().unwrap_or(0) % 5 {
                0 => san.to_string(),
                1 => format!("{} {{a comment}}", san),
                2 => format!("{} $14", san),
                3 => format!("{}!?", san),
                _ => format!("{} (a side line)", san),
            }
        })
    }

    fn decorated_movetext(&self, decorate: impl Fn(usize, &str) -> String) -> String {
        let mut out = String::new();
        for (ply, san) in self.sans.iter().enumerate() {
            if ply % 2 == 0 {
                out.push_str(&format!("{}. ", ply / 2 + 1));
            }
            out.push_str(&decorate(ply, san));
            out.push(' ');
        }
        out.push('*');
        out
    }
}

/// Play a game by picking one legal move per entry of `choices`, stopping
/// early at mate or stalemate.
pub fn game_from_choices(choices: &[Index]) -> RandomGame {
    let start = Chess::default();
    let mut board = start.clone();
    let mut moves = Vec::new();
    let mut sans = Vec::new();

    for choice in choices {
        let legal = board.legal_moves();
        if legal.is_empty() {
            break;
        }
        let mv = legal[choice.index(legal.len())].clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut board, &mv);
        sans.push(san.to_string());
        moves.push(mv);
    }

    RandomGame { start, moves, sans }
}

/// Generate a random legal game of at most `max_plies` moves.
pub fn random_game(max_plies: usize) -> impl Strategy<Value = RandomGame> {
    prop::collection::vec(any::<Index>(), 0..=max_plies).prop_map(|choices| game_from_choices(&choices))
}

/// Generate a random game together with per-move decoration choices for
/// [`RandomGame::annotated_movetext`].
pub fn annotated_game(max_plies: usize) -> impl Strategy<Value = (RandomGame, Vec<u8>)> {
    random_game(max_plies).prop_flat_map(|game| {
        let len = game.sans.len();
        (Just(game), prop::collection::vec(any::<u8>(), len))
    })
}

/// Generate a collection of games as one PGN text.
pub fn pgn_collection(max_games: usize, max_plies: usize) -> impl Strategy<Value = (Vec<RandomGame>, String)> {
    prop::collection::vec(random_game(max_plies), 1..=max_games).prop_map(|games| {
        let text = games
            .iter()
            .map(RandomGame::to_pgn)
            .collect::<Vec<_>>()
            .join("\n");
        (games, text)
    })
}

/// Generate a non-empty FEN-like string. Not necessarily a legal position.
pub fn fen_like() -> impl Strategy<Value = String> {
    "[1-8pnbrqkPNBRQK/]{8,40} [wb] [KQkq-]{1,4} [-a-h1-8]{1,2} [0-9]{1,2} [1-9][0-9]{0,2}"
        .prop_map(String::from)
}
