//! Tic-tac-toe for Gamehub: rules, minimax bot, and the
//! [`GameLogic`](gamehub_room::GameLogic) implementation that plugs it
//! into the room framework.
//!
//! Human-vs-human rooms are matched first-fit (first player is X);
//! solo rooms are private, with an easy (random) or hard (full
//! minimax) bot as O.

mod game;
mod rules;
mod strategy;

pub use game::{
    BotDelay, MoveError, Outcome, Seat, TicTacToeClientMessage,
    TicTacToeConfig, TicTacToeGame, TicTacToeServerMessage,
    TicTacToeState,
};
pub use rules::{empty_cells, is_full, winner, Board, Mark, LINES};
pub use strategy::BotStrategy;
