//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider rejected the credential.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session exists for the given player.
    #[error("session not found for player {0}")]
    NotFound(gamehub_protocol::PlayerId),

    /// The reconnection token doesn't match anything the server issued.
    #[error("invalid reconnection token")]
    InvalidToken,

    /// The session's reconnection grace period has elapsed.
    #[error("session expired for player {0}")]
    SessionExpired(gamehub_protocol::PlayerId),

    /// The player already has an active (Connected) session. A player
    /// can only have one session at a time.
    #[error("player {0} already has an active session")]
    AlreadyConnected(gamehub_protocol::PlayerId),
}
