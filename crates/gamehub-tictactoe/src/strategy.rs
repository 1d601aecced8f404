//! Bot move selection.
//!
//! The two difficulties are different algorithms, not a depth-limited
//! variant of one another: easy picks a uniformly random empty cell,
//! hard runs a full minimax search. Both are pure choosers — the chosen
//! move is applied through the same rule engine as human moves.

use gamehub_protocol::Difficulty;
use rand::seq::IndexedRandom;

use crate::rules::{self, Board, Mark};

/// How the bot picks its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStrategy {
    /// Uniformly random among empty cells.
    Easy,
    /// Exhaustive minimax. Never loses.
    Hard,
}

impl From<Difficulty> for BotStrategy {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => Self::Easy,
            Difficulty::Hard => Self::Hard,
        }
    }
}

impl BotStrategy {
    /// Picks a cell for `bot_mark` to play, or `None` on a full or
    /// decided board.
    pub fn choose(self, board: &Board, bot_mark: Mark) -> Option<usize> {
        if rules::winner(board).is_some() {
            return None;
        }
        match self {
            Self::Easy => {
                rules::empty_cells(board).choose(&mut rand::rng()).copied()
            }
            Self::Hard => best_move(board, bot_mark),
        }
    }
}

/// Full minimax over the remaining game tree.
///
/// Maximizes for the bot's mark; terminal values are +1 (bot wins),
/// −1 (opponent wins), 0 (draw). No depth discounting — the tree is at
/// most 9 plies deep, so full search is tractable and ties between
/// equally valued moves are broken by lowest cell index.
fn best_move(board: &Board, bot_mark: Mark) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for cell in rules::empty_cells(board) {
        let mut next = *board;
        next[cell] = Some(bot_mark);
        let score = minimax(&next, bot_mark.opponent(), bot_mark);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((cell, score));
        }
    }
    best.map(|(cell, _)| cell)
}

fn minimax(board: &Board, to_move: Mark, bot_mark: Mark) -> i32 {
    if let Some(mark) = rules::winner(board) {
        return if mark == bot_mark { 1 } else { -1 };
    }
    if rules::is_full(board) {
        return 0;
    }

    let scores = rules::empty_cells(board).into_iter().map(|cell| {
        let mut next = *board;
        next[cell] = Some(to_move);
        minimax(&next, to_move.opponent(), bot_mark)
    });

    if to_move == bot_mark {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}
