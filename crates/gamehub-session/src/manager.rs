//! The session manager: tracks all active player sessions.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: it is owned by
//! the orchestrator and accessed through a mutex one level up. Keeping
//! it plain avoids hidden locking overhead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gamehub_protocol::{PlayerId, PlayerProfile};
use rand::Rng;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Registry of every player currently connected (or recently
/// disconnected and still within their reconnection grace period).
pub struct SessionManager {
    /// All active sessions, keyed by player ID. A player can only have
    /// one session at a time.
    sessions: HashMap<PlayerId, Session>,

    /// Index from reconnection tokens to player IDs, kept in sync with
    /// `sessions` so reconnects don't scan every session.
    tokens: HashMap<String, PlayerId>,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            config,
        }
    }

    /// Creates a new session for a player whose identity has been
    /// resolved. Generates a fresh reconnection token.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the player already has an
    /// active (Connected) session.
    pub fn create(
        &mut self,
        profile: PlayerProfile,
    ) -> Result<&Session, SessionError> {
        let player_id = profile.id;
        if let Some(existing) = self.sessions.get(&player_id) {
            if matches!(existing.state, SessionState::Connected) {
                return Err(SessionError::AlreadyConnected(player_id));
            }
            // Stale disconnected/expired session: invalidate its token
            // before issuing a new one.
            self.tokens.remove(&existing.reconnect_token);
        }

        let token = generate_token();

        let session = Session {
            profile,
            state: SessionState::Connected,
            reconnect_token: token.clone(),
        };

        self.tokens.insert(token, player_id);
        self.sessions.insert(player_id, session);

        tracing::info!(%player_id, "session created");

        Ok(self.sessions.get(&player_id).expect("just inserted"))
    }

    /// Marks a player as disconnected and starts the grace period.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%player_id, "player disconnected, grace period started");
        Ok(())
    }

    /// Reconnects a player using their reconnection token.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::SessionExpired`] — grace period elapsed
    /// - [`SessionError::AlreadyConnected`] — session never dropped
    pub fn reconnect(
        &mut self,
        token: &str,
    ) -> Result<&Session, SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;

        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Disconnected { since } => {
                let grace =
                    Duration::from_secs(self.config.reconnect_grace_secs);
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(player_id));
                }
                session.state = SessionState::Connected;
                tracing::info!(%player_id, "player reconnected");
                Ok(self.sessions.get(&player_id).expect("just modified"))
            }
            SessionState::Connected => {
                Err(SessionError::AlreadyConnected(player_id))
            }
            SessionState::Expired => {
                Err(SessionError::SessionExpired(player_id))
            }
        }
    }

    /// Expires any disconnected session past the grace period. Returns
    /// the expired player IDs so higher layers can react (e.g. tell the
    /// room the player is gone for good) before `cleanup_expired`.
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = &session.state {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    expired.push(session.profile.id);
                    tracing::info!(
                        player_id = %session.profile.id,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired
    }

    /// Removes all expired sessions, freeing memory.
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                self.tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Returns the number of tracked sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Session lifecycle tests. Time-dependent behavior is made
    //! deterministic with a 0-second grace (expires immediately) or a
    //! 1-hour grace (never expires during a test) — no sleeps.

    use super::*;

    fn manager_with_instant_expiry() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 0,
        })
    }

    fn manager_with_long_grace() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 3600,
        })
    }

    fn profile(id: u64) -> PlayerProfile {
        PlayerProfile {
            id: PlayerId(id),
            display_name: format!("player-{id}"),
            college_id: "college-1".into(),
            is_bot: false,
        }
    }

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_create_new_player_returns_connected_session() {
        let mut mgr = manager_with_long_grace();

        let session = mgr.create(profile(1)).expect("should succeed");

        assert!(matches!(session.state, SessionState::Connected));
        assert_eq!(session.profile.id, pid(1));
        assert_eq!(session.profile.display_name, "player-1");
        assert_eq!(session.reconnect_token.len(), 32);
    }

    #[test]
    fn test_create_multiple_players_each_gets_unique_token() {
        let mut mgr = manager_with_long_grace();

        let token1 = mgr.create(profile(1)).unwrap().reconnect_token.clone();
        let token2 = mgr.create(profile(2)).unwrap().reconnect_token.clone();

        assert_ne!(token1, token2, "tokens must be unique per player");
    }

    #[test]
    fn test_create_already_connected_returns_error() {
        let mut mgr = manager_with_long_grace();
        mgr.create(profile(1)).expect("first create should succeed");

        let result = mgr.create(profile(1));

        assert!(
            matches!(result, Err(SessionError::AlreadyConnected(p)) if p == pid(1)),
            "should reject duplicate connected session"
        );
    }

    #[test]
    fn test_create_replaces_disconnected_session() {
        let mut mgr = manager_with_long_grace();
        mgr.create(profile(1)).unwrap();
        mgr.disconnect(pid(1)).unwrap();

        let session =
            mgr.create(profile(1)).expect("should replace disconnected session");
        assert!(matches!(session.state, SessionState::Connected));
    }

    #[test]
    fn test_disconnect_unknown_player_returns_not_found() {
        let mut mgr = manager_with_long_grace();

        let result = mgr.disconnect(pid(99));

        assert!(
            matches!(result, Err(SessionError::NotFound(p)) if p == pid(99))
        );
    }

    #[test]
    fn test_reconnect_valid_token_restores_connected() {
        let mut mgr = manager_with_long_grace();
        let token = mgr.create(profile(1)).unwrap().reconnect_token.clone();
        mgr.disconnect(pid(1)).unwrap();

        let session = mgr.reconnect(&token).expect("should succeed");

        assert!(matches!(session.state, SessionState::Connected));
        assert_eq!(session.profile.id, pid(1));
    }

    #[test]
    fn test_reconnect_invalid_token_returns_error() {
        let mut mgr = manager_with_long_grace();
        mgr.create(profile(1)).unwrap();
        mgr.disconnect(pid(1)).unwrap();

        let result = mgr.reconnect("not-a-real-token");

        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_reconnect_after_grace_period_returns_expired() {
        let mut mgr = manager_with_instant_expiry();
        let token = mgr.create(profile(1)).unwrap().reconnect_token.clone();
        mgr.disconnect(pid(1)).unwrap();

        let result = mgr.reconnect(&token);

        assert!(
            matches!(result, Err(SessionError::SessionExpired(p)) if p == pid(1))
        );
    }

    #[test]
    fn test_expire_stale_expires_timed_out_sessions() {
        let mut mgr = manager_with_instant_expiry();
        mgr.create(profile(1)).unwrap();
        mgr.create(profile(2)).unwrap();
        mgr.disconnect(pid(1)).unwrap();
        // Player 2 stays connected.

        let expired = mgr.expire_stale();

        assert_eq!(expired, vec![pid(1)]);
        let s2 = mgr.get(&pid(2)).unwrap();
        assert!(matches!(s2.state, SessionState::Connected));
    }

    #[test]
    fn test_expire_stale_skips_sessions_within_grace() {
        let mut mgr = manager_with_long_grace();
        mgr.create(profile(1)).unwrap();
        mgr.disconnect(pid(1)).unwrap();

        assert!(mgr.expire_stale().is_empty());
    }

    #[test]
    fn test_cleanup_expired_removes_expired_sessions() {
        let mut mgr = manager_with_instant_expiry();
        mgr.create(profile(1)).unwrap();
        mgr.disconnect(pid(1)).unwrap();
        mgr.expire_stale();
        assert_eq!(mgr.len(), 1);

        mgr.cleanup_expired();

        assert_eq!(mgr.len(), 0);
        assert!(mgr.get(&pid(1)).is_none());
    }

    #[test]
    fn test_cleanup_expired_invalidates_old_token() {
        let mut mgr = manager_with_instant_expiry();
        let token = mgr.create(profile(1)).unwrap().reconnect_token.clone();
        mgr.disconnect(pid(1)).unwrap();
        mgr.expire_stale();
        mgr.cleanup_expired();

        let result = mgr.reconnect(&token);

        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_full_lifecycle_connect_disconnect_reconnect() {
        let mut mgr = manager_with_long_grace();

        let token = mgr.create(profile(1)).unwrap().reconnect_token.clone();
        mgr.disconnect(pid(1)).unwrap();
        assert!(matches!(
            mgr.get(&pid(1)).unwrap().state,
            SessionState::Disconnected { .. }
        ));

        mgr.reconnect(&token).unwrap();
        assert!(matches!(
            mgr.get(&pid(1)).unwrap().state,
            SessionState::Connected
        ));
    }
}
