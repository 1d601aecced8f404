//! Error types for the matchmaking layer.

use gamehub_protocol::PlayerId;

/// Errors that can occur during queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The player is already waiting in the queue.
    #[error("player {0} is already queued")]
    AlreadyQueued(PlayerId),

    /// The player is not in the queue.
    #[error("player {0} is not queued")]
    NotQueued(PlayerId),
}
