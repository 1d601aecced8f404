//! Session types: the server's record of a connected player.

use std::time::Instant;

use gamehub_protocol::PlayerProfile;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a disconnected player has to reconnect
    /// before their session is permanently expired.
    ///
    /// Default: 30 seconds. Set to 0 to disable reconnection entirely.
    pub reconnect_grace_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a player's session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(timeout)──→ Expired
///       ↑                            │
///       └────────(reconnect)─────────┘
/// ```
///
/// `Instant` is monotonic, so elapsed-time checks are immune to wall
/// clock adjustments.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Player is actively connected.
    Connected,

    /// Player disconnected at the given instant. They have until
    /// `since + grace_period` to reconnect.
    Disconnected { since: Instant },

    /// Grace period elapsed; session is dead and will be cleaned up.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session on the server.
///
/// Created after the identity provider resolves a credential; lives
/// until the player disconnects and the grace period expires.
#[derive(Debug, Clone)]
pub struct Session {
    /// Who the player is, as resolved by the identity provider.
    pub profile: PlayerProfile,

    /// Current lifecycle state.
    pub state: SessionState,

    /// A secret token the player can use to resume after a brief
    /// disconnect without re-authenticating. 32 hex chars, 128 bits.
    pub reconnect_token: String,
}
