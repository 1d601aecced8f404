//! Unified error type for the Gamehub engine.

use gamehub_matchmaking::QueueError;
use gamehub_protocol::ProtocolError;
use gamehub_room::RoomError;
use gamehub_session::SessionError;
use gamehub_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gamehub` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GamehubError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, reconnect, expired).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A matchmaking error (already queued, not queued).
    #[error(transparent)]
    Queue(#[from] QueueError),
}
