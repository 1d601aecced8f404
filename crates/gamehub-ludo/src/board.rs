//! The Ludo board model and pure movement rules.
//!
//! Everything here is a pure function over pieces — no randomness, no
//! players, no turn logic. The game layer composes these into turns.

use serde::{Deserialize, Serialize};

/// Number of cells on the circular path (0–51).
pub const PATH_LEN: u8 = 52;

/// The final cell. Reaching it exactly finishes a piece.
pub const LAST_CELL: i8 = 51;

/// Pieces per player.
pub const PIECES_PER_PLAYER: usize = 4;

/// Path cells flagged immune to capture in the board model.
///
/// Modeled for the UI, but deliberately NOT consulted by
/// [`check_captures`] — mutual capture applies everywhere. See the
/// pinning test in the game module before changing this.
pub const SAFE_CELLS: [i8; 8] = [0, 8, 13, 21, 26, 34, 39, 47];

/// Where a piece is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceStatus {
    /// In the home yard, not yet on the path.
    Home,
    /// Somewhere on cells 0–51.
    OnPath,
    /// Traversed the full path.
    Finished,
}

/// One of a player's four tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    /// Owning seat index (0–3).
    pub owner: usize,
    /// Piece number within the seat (0–3).
    pub number: u8,
    pub status: PieceStatus,
    /// Path cell 0–51 while on path; −1 when home or finished.
    pub position: i8,
}

impl Piece {
    /// A fresh piece in the home yard.
    pub fn home(owner: usize, number: u8) -> Self {
        Self {
            owner,
            number,
            status: PieceStatus::Home,
            position: -1,
        }
    }
}

/// Whether `piece` may move by `dice`.
///
/// A home piece can leave only on a roll of exactly 6. A piece on the
/// path can move unless the roll would overshoot cell 51 — overshoot is
/// simply illegal, never clamped. Finished pieces never move.
pub fn can_move(piece: &Piece, dice: u8) -> bool {
    match piece.status {
        PieceStatus::Home => dice == 6,
        PieceStatus::OnPath => piece.position + dice as i8 <= LAST_CELL,
        PieceStatus::Finished => false,
    }
}

/// Indices (into `pieces`) of `owner`'s pieces that may move by `dice`.
pub fn legal_pieces(pieces: &[Piece], owner: usize, dice: u8) -> Vec<usize> {
    pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| p.owner == owner && can_move(p, dice))
        .map(|(i, _)| i)
        .collect()
}

/// Applies a legal move to `piece`.
///
/// Home → path enters at cell 0. A path piece advances by `dice`;
/// landing exactly on cell 51 finishes it (position returns to the −1
/// placeholder). Callers must have checked [`can_move`] first.
pub fn apply_move(piece: &mut Piece, dice: u8) {
    match piece.status {
        PieceStatus::Home => {
            piece.status = PieceStatus::OnPath;
            piece.position = 0;
        }
        PieceStatus::OnPath => {
            piece.position += dice as i8;
            if piece.position == LAST_CELL {
                piece.status = PieceStatus::Finished;
                piece.position = -1;
            }
        }
        PieceStatus::Finished => {}
    }
}

/// Applies the mutual-capture rule and returns who was captured.
///
/// Every on-path cell occupied by pieces of more than one owner sends
/// ALL pieces on that cell home — capture is symmetric, and same-owner
/// stacks are never split up. Safe cells are intentionally not
/// consulted (see [`SAFE_CELLS`]).
pub fn check_captures(pieces: &mut [Piece]) -> Vec<(usize, u8)> {
    let mut captured = Vec::new();

    for cell in 0..PATH_LEN as i8 {
        let on_cell: Vec<usize> = pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.status == PieceStatus::OnPath && p.position == cell
            })
            .map(|(i, _)| i)
            .collect();

        let mut owners: Vec<usize> =
            on_cell.iter().map(|&i| pieces[i].owner).collect();
        owners.sort_unstable();
        owners.dedup();
        if owners.len() < 2 {
            continue;
        }

        for i in on_cell {
            let piece = &mut pieces[i];
            piece.status = PieceStatus::Home;
            piece.position = -1;
            captured.push((piece.owner, piece.number));
        }
    }

    captured
}

/// True iff all of `owner`'s pieces are finished.
pub fn check_win(pieces: &[Piece], owner: usize) -> bool {
    pieces
        .iter()
        .filter(|p| p.owner == owner)
        .all(|p| p.status == PieceStatus::Finished)
}

/// True iff `owner` still has at least one unfinished piece.
pub fn has_unfinished(pieces: &[Piece], owner: usize) -> bool {
    pieces
        .iter()
        .any(|p| p.owner == owner && p.status != PieceStatus::Finished)
}

/// A full starting board for `seats` players, all pieces home.
pub fn initial_pieces(seats: usize) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(seats * PIECES_PER_PLAYER);
    for owner in 0..seats {
        for number in 0..PIECES_PER_PLAYER as u8 {
            pieces.push(Piece::home(owner, number));
        }
    }
    pieces
}
