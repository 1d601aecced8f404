//! Player identity and session tracking.
//!
//! A session is the server's record of an authenticated player. Sessions
//! survive brief disconnects: a disconnected player has a grace period to
//! reconnect using a secret token before the session is expired for good.
//!
//! Credential validation itself is delegated to an [`IdentityProvider`]
//! supplied by the embedding application.

pub mod error;
pub mod identity;
pub mod manager;
pub mod session;

pub use error::SessionError;
pub use identity::IdentityProvider;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
