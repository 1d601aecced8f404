//! Pure tic-tac-toe rules: board, lines, winner and draw detection.

use serde::{Deserialize, Serialize};

/// A player's mark. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
        }
    }
}

/// The 9-cell board, row-major.
pub type Board = [Option<Mark>; 9];

/// The 8 canonical winning lines: 3 rows, 3 columns, 2 diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the mark filling any complete line, if one does.
pub fn winner(board: &Board) -> Option<Mark> {
    for [a, b, c] in LINES {
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return Some(mark);
            }
        }
    }
    None
}

/// True when no empty cells remain. Combined with no winner this
/// signals a draw.
pub fn is_full(board: &Board) -> bool {
    board.iter().all(|cell| cell.is_some())
}

/// Indices of all empty cells.
pub fn empty_cells(board: &Board) -> Vec<usize> {
    board
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_none())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(marks: [&str; 9]) -> Board {
        marks.map(|m| match m {
            "X" => Some(Mark::X),
            "O" => Some(Mark::O),
            _ => None,
        })
    }

    #[test]
    fn test_winner_detects_every_line() {
        for line in LINES {
            let mut board: Board = [None; 9];
            for i in line {
                board[i] = Some(Mark::X);
            }
            assert_eq!(winner(&board), Some(Mark::X), "line {line:?}");
        }
    }

    #[test]
    fn test_winner_none_on_empty_or_partial_board() {
        assert_eq!(winner(&[None; 9]), None);
        let board = board_from(["X", "O", "X", "", "", "", "", "", ""]);
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_winner_invariant_under_rotation_and_reflection() {
        // Rotating or reflecting a winning board must preserve winner
        // detection — the 8 lines cover the symmetry group.
        fn rotate(board: &Board) -> Board {
            let r = [6, 3, 0, 7, 4, 1, 8, 5, 2];
            r.map(|i| board[i])
        }
        fn reflect(board: &Board) -> Board {
            let r = [2, 1, 0, 5, 4, 3, 8, 7, 6];
            r.map(|i| board[i])
        }

        let winning = board_from(["X", "X", "X", "O", "O", "", "", "", ""]);
        let mut variants = vec![winning];
        for _ in 0..3 {
            let last = *variants.last().unwrap();
            variants.push(rotate(&last));
        }
        let reflections: Vec<Board> =
            variants.iter().map(reflect).collect();
        variants.extend(reflections);

        for variant in variants {
            assert_eq!(winner(&variant), Some(Mark::X));
        }
    }

    #[test]
    fn test_is_full_and_draw_detection() {
        let draw = board_from([
            "X", "O", "X", //
            "X", "O", "O", //
            "O", "X", "X",
        ]);
        assert!(is_full(&draw));
        assert_eq!(winner(&draw), None);

        let open = board_from(["X", "O", "X", "", "", "", "", "", ""]);
        assert!(!is_full(&open));
    }

    #[test]
    fn test_empty_cells_lists_open_positions() {
        let board = board_from(["X", "", "O", "", "", "", "", "", "X"]);
        assert_eq!(empty_cells(&board), vec![1, 3, 4, 5, 6, 7]);
    }
}
