//! The Gamehub server: owns shared state and accepts connections.
//!
//! One task per connection, one task per room. Shared state (sessions,
//! queue, room managers) sits behind mutexes in [`ServerState`]; the
//! connection handlers keep lock scopes tight and never hold a lock
//! across network I/O.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use gamehub_ludo::{LudoConfig, LudoGame};
use gamehub_matchmaking::{MatchQueue, QueueConfig};
use gamehub_room::{NullSink, ResultSink, RoomManager};
use gamehub_session::{IdentityProvider, SessionConfig, SessionManager};
use gamehub_tictactoe::TicTacToeGame;
use gamehub_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::registry::ConnectionRegistry;
use crate::GamehubError;

/// The wire protocol version this server speaks. Clients announcing a
/// different version are rejected during the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared state for all connection handlers.
pub(crate) struct ServerState<I: IdentityProvider> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) queue: Mutex<MatchQueue>,
    pub(crate) ludo_rooms: Mutex<RoomManager<LudoGame>>,
    pub(crate) ttt_rooms: Mutex<RoomManager<TicTacToeGame>>,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) identity: I,
    pub(crate) ludo_config: LudoConfig,
    started_at: Instant,
}

impl<I: IdentityProvider> ServerState<I> {
    /// Milliseconds since the server started. Used as the envelope
    /// timestamp — monotonic, immune to wall clock adjustments.
    pub(crate) fn now_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    pub(crate) fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Builder for [`GamehubServer`].
pub struct GamehubServerBuilder<I: IdentityProvider> {
    addr: String,
    identity: I,
    session_config: SessionConfig,
    queue_config: QueueConfig,
    ludo_config: LudoConfig,
    sink: Arc<dyn ResultSink>,
}

impl<I: IdentityProvider> GamehubServerBuilder<I> {
    fn new(identity: I) -> Self {
        Self {
            addr: "127.0.0.1:8080".into(),
            identity,
            session_config: SessionConfig::default(),
            queue_config: QueueConfig::default(),
            ludo_config: LudoConfig::default(),
            sink: Arc::new(NullSink),
        }
    }

    /// Sets the address to listen on. Default: `127.0.0.1:8080`.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Sets the session configuration (reconnect grace period).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the matchmaking queue configuration (capacity, bot fill).
    pub fn queue_config(mut self, config: QueueConfig) -> Self {
        self.queue_config = config;
        self
    }

    /// Sets the Ludo game configuration (start countdown, bot delay).
    pub fn ludo_config(mut self, config: LudoConfig) -> Self {
        self.ludo_config = config;
        self
    }

    /// Sets the sink that receives a summary whenever a match finishes.
    /// Default: discard.
    pub fn result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Binds the listener and constructs the server.
    ///
    /// # Errors
    /// Returns a transport error when the address can't be bound.
    pub async fn build(self) -> Result<GamehubServer<I>, GamehubError> {
        let transport = WebSocketTransport::bind(&self.addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            queue: Mutex::new(MatchQueue::new(self.queue_config)),
            ludo_rooms: Mutex::new(RoomManager::new(Arc::clone(&self.sink))),
            ttt_rooms: Mutex::new(RoomManager::new(self.sink)),
            registry: ConnectionRegistry::default(),
            identity: self.identity,
            ludo_config: self.ludo_config,
            started_at: Instant::now(),
        });

        Ok(GamehubServer { transport, state })
    }
}

/// The orchestration server. Accepts WebSocket connections and spawns
/// a handler task per connection.
pub struct GamehubServer<I: IdentityProvider> {
    transport: WebSocketTransport,
    state: Arc<ServerState<I>>,
}

impl<I: IdentityProvider> GamehubServer<I> {
    /// Starts building a server around the given identity provider.
    pub fn builder(identity: I) -> GamehubServerBuilder<I> {
        GamehubServerBuilder::new(identity)
    }

    /// Returns the local address the listener is bound to. Useful when
    /// binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop. Each accepted connection gets its own
    /// task; a failed accept is logged and the loop continues.
    pub async fn run(mut self) -> Result<(), GamehubError> {
        tracing::info!("gamehub server running");
        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(state, conn));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
