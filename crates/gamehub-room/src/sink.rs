//! Match result reporting hook.
//!
//! When a game ends, the room hands a [`MatchSummary`] to the
//! [`ResultSink`] the server was built with — a leaderboard service in
//! production, a log line in development, a captured `Vec` in tests.
//! Sink failures are the sink's problem: the room has already moved on
//! and is never blocked or broken by them.

use gamehub_protocol::{GameKind, PlayerId, PlayerProfile, RoomId};
use serde::{Deserialize, Serialize};

/// How a match reached its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The game was played to a natural conclusion (win or draw).
    Completed,
    /// The game ended because a player left or disconnected for good.
    Abandoned,
}

/// Everything a results service needs to record one finished match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub room_id: RoomId,
    pub game: GameKind,
    /// Everyone who was seated when the game started, in turn order.
    pub participants: Vec<PlayerProfile>,
    /// `None` for a draw or an abandoned game with no decided winner.
    pub winner: Option<PlayerId>,
    pub outcome: MatchOutcome,
}

/// Receives match results when games finish.
///
/// `record` is fire-and-forget from the room's point of view:
/// implementations that need to do real I/O should spawn a task and
/// return immediately.
pub trait ResultSink: Send + Sync + 'static {
    fn record(&self, summary: MatchSummary);
}

/// Discards all results. Useful in tests and demos.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn record(&self, _summary: MatchSummary) {}
}

/// Logs each result through `tracing`. The development default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn record(&self, summary: MatchSummary) {
        tracing::info!(
            room_id = %summary.room_id,
            game = %summary.game,
            winner = ?summary.winner,
            outcome = ?summary.outcome,
            participants = summary.participants.len(),
            "match result"
        );
    }
}
