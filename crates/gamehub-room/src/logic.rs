//! The `GameLogic` trait — the main extension point for game developers.
//!
//! This is the single trait that game implementations provide. The
//! framework calls these methods at the right time; the implementation
//! just writes game rules.

use std::time::Duration;

use gamehub_protocol::{GameKind, PlayerId, PlayerProfile, Recipient};
use serde::{de::DeserializeOwned, Serialize};

use crate::RoomConfig;

/// A pending bot action: which seat should act, and after how long.
///
/// Returned by [`GameLogic::bot_turn`] when the game is waiting on a
/// bot. The room schedules a timer and calls [`GameLogic::bot_act`]
/// when it fires — the delay is what makes bots feel like opponents
/// instead of instant responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotTurn {
    /// The bot player who should act.
    pub seat: PlayerId,
    /// How long to wait before acting.
    pub delay: Duration,
}

/// The core trait that game implementations provide.
///
/// Each associated type defines the shape of the game's data:
/// - `Config` — game-specific settings (bot difficulty, etc.)
/// - `State` — the full game state (board, whose turn, etc.)
/// - `ClientMessage` — what clients can send (moves, actions)
/// - `ServerMessage` — what the server sends back (events, rejections)
///
/// The framework calls `init` once the room's start countdown elapses,
/// routes client messages through `validate_message` then
/// `handle_message`, and drives bot seats through `bot_turn`/`bot_act`.
pub trait GameLogic: Send + Sync + 'static {
    /// Game-specific configuration (e.g., bot difficulty).
    type Config: Send + Sync + Clone + Default;

    /// The full game state. Must be serializable so the framework can
    /// send snapshots to clients.
    type State: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Messages that clients send to the server (e.g., "roll the dice").
    type ClientMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Messages that the server sends to clients (e.g., "dice rolled",
    /// "move rejected").
    type ServerMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Which game this logic implements. Used for room listings and
    /// match summaries.
    fn kind() -> GameKind;

    /// Creates the initial game state when a room starts.
    ///
    /// Called once when the room transitions from Starting → InProgress.
    /// `players` are the full profiles of everyone in the room, in join
    /// order — join order defines turn order.
    fn init(config: &Self::Config, players: &[PlayerProfile]) -> Self::State;

    /// Processes a message from a client.
    ///
    /// This is where game rules live. Returns a list of messages to send
    /// back — each paired with a `Recipient` specifying who gets it.
    fn handle_message(
        state: &mut Self::State,
        sender: PlayerId,
        msg: Self::ClientMessage,
    ) -> Vec<(Recipient, Self::ServerMessage)>;

    /// Returns `true` if the game is over.
    ///
    /// Called after every `handle_message` and `bot_act`. When this
    /// returns `true`, the room transitions to Finished.
    fn is_finished(state: &Self::State) -> bool;

    /// Returns the winning player once the game is finished, if there
    /// is one (a draw has none).
    fn winner(state: &Self::State) -> Option<PlayerId>;

    /// Validates a client message before processing.
    ///
    /// Called before `handle_message`. If this returns `Err`, the
    /// message is dropped and the rejection event is sent back to the
    /// offending player only — never broadcast. Default: accept all.
    fn validate_message(
        _state: &Self::State,
        _sender: PlayerId,
        _msg: &Self::ClientMessage,
    ) -> Result<(), Self::ServerMessage> {
        Ok(())
    }

    /// Reports whether the game is currently waiting on a bot seat.
    ///
    /// Called after the game starts and after every processed action.
    /// Returning `Some` makes the room schedule a [`BotTurn::delay`]
    /// timer and call [`Self::bot_act`] when it fires. Default: no bots.
    fn bot_turn(_config: &Self::Config, _state: &Self::State) -> Option<BotTurn> {
        None
    }

    /// Performs the bot's action for the given seat.
    ///
    /// Only called when a previously scheduled bot turn fires and the
    /// game is still waiting on that same seat — if a disconnect or
    /// game end changed things in the meantime, the call is skipped.
    /// Default: no-op.
    fn bot_act(
        _config: &Self::Config,
        _state: &mut Self::State,
        _seat: PlayerId,
    ) -> Vec<(Recipient, Self::ServerMessage)> {
        Vec::new()
    }

    /// Called when a player leaves or disconnects mid-game.
    ///
    /// Use this to end the game in the remaining players' favor, skip
    /// the seat, etc. Default: no-op.
    fn on_player_disconnect(
        _state: &mut Self::State,
        _player: PlayerId,
    ) -> Vec<(Recipient, Self::ServerMessage)> {
        Vec::new()
    }

    /// Returns the room configuration for this game type.
    ///
    /// Override to customize player limits, start countdown, etc.
    /// Default: `RoomConfig::default()`.
    fn room_config(_config: &Self::Config) -> RoomConfig {
        RoomConfig::default()
    }
}
