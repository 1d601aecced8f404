//! # Gamehub
//!
//! Real-time multiplayer game orchestration over WebSockets.
//!
//! Gamehub runs server-authoritative turn-based games. Players connect,
//! authenticate through a pluggable [`IdentityProvider`], and are
//! matched into rooms: a FIFO queue forms 4-player Ludo matches, and
//! first-fit pairing or private solo rooms host Tic-Tac-Toe. Each room
//! is an isolated actor; finished matches are reported to a pluggable
//! [`ResultSink`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gamehub::prelude::*;
//!
//! struct MyIdentity;
//!
//! impl IdentityProvider for MyIdentity {
//!     async fn resolve(
//!         &self,
//!         credential: &str,
//!     ) -> Result<PlayerProfile, SessionError> {
//!         // Validate the credential against your account system.
//!         # let _ = credential;
//!         # unimplemented!()
//!     }
//! }
//!
//! # async fn run() -> Result<(), GamehubError> {
//! let server = GamehubServer::builder(MyIdentity)
//!     .bind("0.0.0.0:8080")
//!     .result_sink(Arc::new(LogSink))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! [`IdentityProvider`]: gamehub_session::IdentityProvider
//! [`ResultSink`]: gamehub_room::ResultSink

mod error;
mod handler;
mod registry;
mod server;

pub use error::GamehubError;
pub use server::{GamehubServer, GamehubServerBuilder, PROTOCOL_VERSION};

/// Everything needed to stand up a server and talk to it.
pub mod prelude {
    pub use crate::{
        GamehubError, GamehubServer, GamehubServerBuilder, PROTOCOL_VERSION,
    };

    pub use gamehub_protocol::{
        Channel, Codec, Difficulty, Envelope, GameKind, JsonCodec, Payload,
        PlayerId, PlayerProfile, RoomId, RoomListEntry, SystemMessage,
    };

    pub use gamehub_session::{
        IdentityProvider, SessionConfig, SessionError,
    };

    pub use gamehub_matchmaking::{FillStrategy, QueueConfig};

    pub use gamehub_room::{
        LogSink, MatchOutcome, MatchSummary, NullSink, ResultSink,
    };

    pub use gamehub_ludo::{
        LudoClientMessage, LudoConfig, LudoServerMessage, LudoState,
    };

    pub use gamehub_tictactoe::{
        Mark, TicTacToeClientMessage, TicTacToeConfig,
        TicTacToeServerMessage, TicTacToeState,
    };
}
