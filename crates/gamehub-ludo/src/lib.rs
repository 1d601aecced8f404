//! Ludo for Gamehub: board model, rule engine, bot, and the
//! [`GameLogic`](gamehub_room::GameLogic) implementation that plugs it
//! into the room framework.
//!
//! A match seats exactly 4 players (humans and filler bots) in queue
//! join order. After the start countdown, turns proceed in seat order:
//! roll the dice, then move a legal piece. Mutual capture applies on
//! shared cells; the first player to finish all 4 pieces wins.

mod board;
mod bot;
mod game;

pub use board::{
    apply_move, can_move, check_captures, check_win, initial_pieces,
    legal_pieces, Piece, PieceStatus, LAST_CELL, PATH_LEN,
    PIECES_PER_PLAYER, SAFE_CELLS,
};
pub use game::{
    Color, HistoryEntry, LudoClientMessage, LudoConfig, LudoGame,
    LudoMoveError, LudoServerMessage, LudoState, Seat, HISTORY_CAP,
};
