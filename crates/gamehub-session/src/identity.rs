//! Identity resolution hook.
//!
//! The engine never validates credentials itself. An external identity
//! provider (the account system that issued the credential) resolves an
//! opaque credential string into a [`PlayerProfile`]: user id, display
//! name, and college affiliation. The engine treats this as a pure
//! lookup.
//!
//! Implementations plug in at server construction: a JWT validator in
//! production, a parse-the-token stub in development, a fixed map in
//! tests.

use gamehub_protocol::PlayerProfile;

use crate::SessionError;

/// Resolves a client's opaque credential into a player profile.
///
/// Called once per connection during the handshake.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Validates the credential and returns who the player is.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when the credential is invalid,
    /// expired, or unknown to the provider.
    fn resolve(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<PlayerProfile, SessionError>> + Send;
}
