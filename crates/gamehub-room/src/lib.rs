//! Room lifecycle management for Gamehub.
//!
//! Each room runs as an isolated Tokio task (actor model) with its own
//! game state and player list. Start countdowns and bot turn delays are
//! timers that post back into the actor's command channel.
//!
//! # Key types
//!
//! - [`GameLogic`] — the trait game implementations provide
//! - [`RoomManager`] — creates/destroys rooms, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomState`] — lifecycle state machine
//! - [`RoomConfig`] — room settings (player limits, start delay, etc.)
//! - [`ResultSink`] — where finished match results go

mod config;
mod error;
mod logic;
mod manager;
mod room;
mod sink;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use logic::{BotTurn, GameLogic};
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomOutbound};
pub use sink::{LogSink, MatchOutcome, MatchSummary, NullSink, ResultSink};
