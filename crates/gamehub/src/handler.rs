//! Per-connection handler: handshake, message dispatch, cleanup.
//!
//! Each connection runs this sequence in its own task:
//!
//! 1. Handshake — resolve the credential, create a session.
//! 2. Spawn a pump task that frames and writes outbound messages.
//! 3. Recv loop — dispatch system messages and route game messages.
//! 4. On any exit path, the [`SessionGuard`] drop kicks off cleanup:
//!    leave the queue, leave the room, mark the session disconnected.
//!
//! Room events reach the socket through a relay: the room actor pushes
//! [`RoomOutbound`] events into a per-membership channel, a relay task
//! translates them to wire messages, and the pump writes them out.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use gamehub_ludo::LudoClientMessage;
use gamehub_matchmaking::{synthesize_bot, QueueEvent};
use gamehub_protocol::{
    Channel, Codec, Envelope, GameKind, JsonCodec, Payload, PlayerId,
    PlayerProfile, RoomId, RoomListEntry, SystemMessage,
};
use gamehub_room::{GameLogic, RoomError, RoomOutbound};
use gamehub_session::{IdentityProvider, SessionError};
use gamehub_tictactoe::{TicTacToeClientMessage, TicTacToeConfig};
use gamehub_transport::Connection;

use crate::registry::{Outbound, OutboundSender};
use crate::server::{ServerState, PROTOCOL_VERSION};

/// How long a new connection has to complete the handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long the recv loop waits before declaring the connection dead.
/// Clients heartbeat every few seconds, so this allows several misses.
const RECV_TIMEOUT: Duration = Duration::from_secs(15);

/// Why the handshake didn't produce a session.
enum HandshakeFailure {
    /// Send this rejection to the client before closing.
    Reject { code: u16, message: String },
    /// The connection died first; nothing to send.
    Closed,
}

/// Drop guard that cleans up after a connection, whatever the exit
/// path: recv error, idle timeout, client disconnect, or panic in the
/// dispatch code. Drop can't be async, so it spawns the cleanup task.
struct SessionGuard<I: IdentityProvider> {
    state: Arc<ServerState<I>>,
    player_id: PlayerId,
}

impl<I: IdentityProvider> Drop for SessionGuard<I> {
    fn drop(&mut self) {
        let state = Arc::clone(&self.state);
        let player_id = self.player_id;
        tokio::spawn(async move {
            state.registry.unregister(player_id).await;

            let queue_event = state.queue.lock().await.leave(player_id);
            if let Ok(QueueEvent::Updated { players, needed }) = queue_event {
                broadcast_queue_update(&state, &players, needed).await;
            }

            let in_ludo = state
                .ludo_rooms
                .lock()
                .await
                .player_room(&player_id)
                .is_some();
            if in_ludo {
                if let Err(e) =
                    state.ludo_rooms.lock().await.leave_room(player_id).await
                {
                    tracing::warn!(%player_id, error = %e, "cleanup leave failed");
                }
            } else {
                let mut rooms = state.ttt_rooms.lock().await;
                if rooms.player_room(&player_id).is_some() {
                    if let Err(e) = rooms.leave_room(player_id).await {
                        tracing::warn!(%player_id, error = %e, "cleanup leave failed");
                    }
                }
            }

            if let Err(e) = state.sessions.lock().await.disconnect(player_id) {
                tracing::debug!(%player_id, error = %e, "session already gone");
            }
        });
    }
}

/// Handles one connection from handshake to cleanup.
pub(crate) async fn handle_connection<I, Conn>(
    state: Arc<ServerState<I>>,
    conn: Conn,
) where
    I: IdentityProvider,
    Conn: Connection + Clone,
{
    let profile = match perform_handshake(&state, &conn).await {
        Ok(profile) => profile,
        Err(HandshakeFailure::Reject { code, message }) => {
            tracing::info!(conn_id = %conn.id(), code, %message, "handshake rejected");
            send_now(
                &conn,
                &state,
                SystemMessage::Error { code, message },
            )
            .await;
            let _ = conn.close().await;
            return;
        }
        Err(HandshakeFailure::Closed) => {
            let _ = conn.close().await;
            return;
        }
    };

    let player_id = profile.id;
    tracing::info!(%player_id, conn_id = %conn.id(), "player connected");

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    state.registry.register(player_id, out_tx.clone()).await;
    tokio::spawn(outbound_pump(conn.clone(), out_rx, state.started_at()));

    let _guard = SessionGuard {
        state: Arc::clone(&state),
        player_id,
    };

    send_system(
        &out_tx,
        SystemMessage::HandshakeAck {
            player_id,
            display_name: profile.display_name.clone(),
            server_time: state.now_ms(),
        },
    );

    loop {
        let received = tokio::time::timeout(RECV_TIMEOUT, conn.recv()).await;
        let bytes = match received {
            Err(_) => {
                tracing::info!(%player_id, "connection idle, dropping");
                break;
            }
            Ok(Ok(None)) => break,
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv failed");
                break;
            }
            Ok(Ok(Some(bytes))) => bytes,
        };

        let envelope: Envelope = match JsonCodec.decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "malformed envelope");
                send_error(&out_tx, 400, "malformed envelope");
                continue;
            }
        };

        match envelope.payload {
            Payload::System(msg) => {
                let close =
                    handle_system_message(&state, &profile, &out_tx, msg)
                        .await;
                if close {
                    break;
                }
            }
            Payload::Game(data) => {
                handle_game_message(&state, &profile, &out_tx, &data).await;
            }
        }
    }

    let _ = conn.close().await;
    tracing::info!(%player_id, "connection closed");
}

/// Runs the handshake: first message must be a `Handshake` with a
/// matching protocol version and a credential the identity provider
/// accepts.
async fn perform_handshake<I: IdentityProvider>(
    state: &ServerState<I>,
    conn: &impl Connection,
) -> Result<PlayerProfile, HandshakeFailure> {
    let received =
        tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await;
    let bytes = match received {
        Err(_) => {
            return Err(HandshakeFailure::Reject {
                code: 408,
                message: "handshake timed out".into(),
            });
        }
        Ok(Ok(None)) | Ok(Err(_)) => return Err(HandshakeFailure::Closed),
        Ok(Ok(Some(bytes))) => bytes,
    };

    let envelope: Envelope = JsonCodec.decode(&bytes).map_err(|_| {
        HandshakeFailure::Reject {
            code: 400,
            message: "malformed handshake".into(),
        }
    })?;

    let (version, credential) = match envelope.payload {
        Payload::System(SystemMessage::Handshake {
            version,
            credential,
        }) => (version, credential),
        _ => {
            return Err(HandshakeFailure::Reject {
                code: 400,
                message: "expected handshake".into(),
            });
        }
    };

    if version != PROTOCOL_VERSION {
        return Err(HandshakeFailure::Reject {
            code: 400,
            message: format!(
                "unsupported protocol version {version} (server speaks {PROTOCOL_VERSION})"
            ),
        });
    }

    let Some(credential) = credential else {
        return Err(HandshakeFailure::Reject {
            code: 401,
            message: "credential required".into(),
        });
    };

    let profile =
        state.identity.resolve(&credential).await.map_err(|e| {
            HandshakeFailure::Reject {
                code: 401,
                message: e.to_string(),
            }
        })?;

    state
        .sessions
        .lock()
        .await
        .create(profile.clone())
        .map_err(|e| {
            let code = match e {
                SessionError::AlreadyConnected(_) => 409,
                _ => 401,
            };
            HandshakeFailure::Reject {
                code,
                message: e.to_string(),
            }
        })?;

    Ok(profile)
}

/// Dispatches one system message. Returns `true` when the connection
/// should close.
async fn handle_system_message<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    profile: &PlayerProfile,
    out: &OutboundSender,
    msg: SystemMessage,
) -> bool {
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            send_system(
                out,
                SystemMessage::HeartbeatAck {
                    client_time,
                    server_time: state.now_ms(),
                },
            );
        }

        SystemMessage::JoinQueue => {
            if in_any_room(state, profile.id).await {
                send_error(out, 409, "already in a room");
                return false;
            }
            let result =
                state.queue.lock().await.enqueue(profile.clone());
            match result {
                Ok(QueueEvent::Updated { players, needed }) => {
                    broadcast_queue_update(state, &players, needed).await;
                }
                Ok(QueueEvent::Ready(players)) => {
                    form_ludo_match(state, players).await;
                }
                Err(e) => send_error(out, 409, &e.to_string()),
            }
        }

        SystemMessage::LeaveQueue => {
            let result = state.queue.lock().await.leave(profile.id);
            match result {
                Ok(QueueEvent::Updated { players, needed }) => {
                    broadcast_queue_update(state, &players, needed).await;
                }
                Ok(QueueEvent::Ready(_)) => {}
                Err(e) => send_error(out, 400, &e.to_string()),
            }
        }

        SystemMessage::JoinOrCreate => {
            if in_any_room(state, profile.id).await {
                send_error(out, 409, "already in a room");
                return false;
            }
            let (relay_tx, relay_rx) = mpsc::unbounded_channel();
            let result = {
                let mut rooms = state.ttt_rooms.lock().await;
                rooms
                    .join_or_create(
                        profile.clone(),
                        TicTacToeConfig::default(),
                        relay_tx,
                    )
                    .await
            };
            match result {
                Ok(room_id) => {
                    spawn_room_relay(room_id, relay_rx, out.clone());
                    send_system(
                        out,
                        SystemMessage::RoomJoined {
                            room_id,
                            game: GameKind::TicTacToe,
                        },
                    );
                }
                Err(e) => send_room_error(out, &e),
            }
        }

        SystemMessage::CreateSolo { difficulty } => {
            if in_any_room(state, profile.id).await {
                send_error(out, 409, "already in a room");
                return false;
            }
            let config = TicTacToeConfig {
                solo: Some(difficulty),
                ..TicTacToeConfig::default()
            };
            let (relay_tx, relay_rx) = mpsc::unbounded_channel();
            let result = {
                let mut rooms = state.ttt_rooms.lock().await;
                let room_id = rooms.create_room(config);
                match rooms
                    .join_room(profile.clone(), room_id, relay_tx)
                    .await
                {
                    Ok(()) => rooms
                        .join_bot(synthesize_bot(), room_id)
                        .await
                        .map(|()| room_id),
                    Err(e) => Err(e),
                }
            };
            match result {
                Ok(room_id) => {
                    spawn_room_relay(room_id, relay_rx, out.clone());
                    send_system(
                        out,
                        SystemMessage::RoomJoined {
                            room_id,
                            game: GameKind::TicTacToe,
                        },
                    );
                }
                Err(e) => send_room_error(out, &e),
            }
        }

        SystemMessage::JoinRoom { room_id } => {
            handle_join_room(state, profile, out, room_id).await;
        }

        SystemMessage::LeaveRoom => {
            let result = {
                let mut rooms = state.ttt_rooms.lock().await;
                if rooms.player_room(&profile.id).is_some() {
                    Some(rooms.leave_room(profile.id).await)
                } else {
                    None
                }
            };
            let result = match result {
                Some(r) => Some(r),
                None => {
                    let mut rooms = state.ludo_rooms.lock().await;
                    if rooms.player_room(&profile.id).is_some() {
                        Some(rooms.leave_room(profile.id).await)
                    } else {
                        None
                    }
                }
            };
            match result {
                None => send_error(out, 400, "not in a room"),
                Some(Err(e)) => send_room_error(out, &e),
                Some(Ok(())) => {}
            }
        }

        SystemMessage::ListRooms => {
            let mut rooms = Vec::new();
            for info in state.ludo_rooms.lock().await.list_rooms().await {
                rooms.push(RoomListEntry {
                    room_id: info.room_id,
                    game: GameKind::Ludo,
                    player_count: info.player_count,
                    max_players: info.max_players,
                });
            }
            for info in state.ttt_rooms.lock().await.list_rooms().await {
                rooms.push(RoomListEntry {
                    room_id: info.room_id,
                    game: GameKind::TicTacToe,
                    player_count: info.player_count,
                    max_players: info.max_players,
                });
            }
            send_system(out, SystemMessage::RoomList { rooms });
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(player_id = %profile.id, %reason, "client disconnecting");
            return true;
        }

        // Server→client messages arriving from a client.
        other => {
            tracing::debug!(player_id = %profile.id, ?other, "unexpected message");
            send_error(out, 400, "unexpected message direction");
        }
    }
    false
}

/// Joins an explicit room id. Room ids are unique across game types,
/// so try the tic-tac-toe manager first and fall back to Ludo when the
/// id isn't one of its rooms.
async fn handle_join_room<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    profile: &PlayerProfile,
    out: &OutboundSender,
    room_id: RoomId,
) {
    if in_any_room(state, profile.id).await {
        send_error(out, 409, "already in a room");
        return;
    }

    // Only a NotFound from the tic-tac-toe manager falls through to
    // the Ludo manager; any other error is final.
    let not_a_ttt_room = {
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let mut rooms = state.ttt_rooms.lock().await;
        match rooms.join_room(profile.clone(), room_id, relay_tx).await {
            Ok(()) => {
                spawn_room_relay(room_id, relay_rx, out.clone());
                send_system(
                    out,
                    SystemMessage::RoomJoined {
                        room_id,
                        game: GameKind::TicTacToe,
                    },
                );
                false
            }
            Err(RoomError::NotFound(_)) => true,
            Err(e) => {
                send_room_error(out, &e);
                false
            }
        }
    };

    if not_a_ttt_room {
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let mut rooms = state.ludo_rooms.lock().await;
        match rooms.join_room(profile.clone(), room_id, relay_tx).await {
            Ok(()) => {
                spawn_room_relay(room_id, relay_rx, out.clone());
                send_system(
                    out,
                    SystemMessage::RoomJoined {
                        room_id,
                        game: GameKind::Ludo,
                    },
                );
            }
            Err(e) => send_room_error(out, &e),
        }
    }
}

/// Whether the player is in a room of either game type. Each manager
/// enforces one-room-at-a-time only within its own game; this check
/// extends the invariant across game types.
async fn in_any_room<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    player_id: PlayerId,
) -> bool {
    if state
        .ludo_rooms
        .lock()
        .await
        .player_room(&player_id)
        .is_some()
    {
        return true;
    }
    state
        .ttt_rooms
        .lock()
        .await
        .player_room(&player_id)
        .is_some()
}

/// Routes a game payload to whichever room the player is in, decoding
/// it as that game's client message type.
async fn handle_game_message<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    profile: &PlayerProfile,
    out: &OutboundSender,
    data: &[u8],
) {
    let in_ludo = state
        .ludo_rooms
        .lock()
        .await
        .player_room(&profile.id)
        .is_some();
    if in_ludo {
        match JsonCodec.decode::<LudoClientMessage>(data) {
            Ok(msg) => {
                if let Err(e) = state
                    .ludo_rooms
                    .lock()
                    .await
                    .route_message(profile.id, msg)
                    .await
                {
                    send_room_error(out, &e);
                }
            }
            Err(e) => {
                tracing::debug!(player_id = %profile.id, error = %e, "bad game message");
                send_error(out, 400, "malformed game message");
            }
        }
        return;
    }

    let in_ttt = state
        .ttt_rooms
        .lock()
        .await
        .player_room(&profile.id)
        .is_some();
    if in_ttt {
        match JsonCodec.decode::<TicTacToeClientMessage>(data) {
            Ok(msg) => {
                if let Err(e) = state
                    .ttt_rooms
                    .lock()
                    .await
                    .route_message(profile.id, msg)
                    .await
                {
                    send_room_error(out, &e);
                }
            }
            Err(e) => {
                tracing::debug!(player_id = %profile.id, error = %e, "bad game message");
                send_error(out, 400, "malformed game message");
            }
        }
        return;
    }

    send_error(out, 400, "not in a room");
}

/// Creates a Ludo room for a formed match and seats everyone in queue
/// order — queue order is turn order.
async fn form_ludo_match<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    players: Vec<PlayerProfile>,
) {
    let mut rooms = state.ludo_rooms.lock().await;
    let room_id = rooms.create_room(state.ludo_config.clone());

    for player in players {
        if player.is_bot {
            if let Err(e) = rooms.join_bot(player, room_id).await {
                tracing::warn!(%room_id, error = %e, "failed to seat bot");
            }
            continue;
        }

        let player_id = player.id;
        let Some(out) = state.registry.sender_for(player_id).await else {
            // Queued player whose connection died between the queue
            // update and match formation.
            tracing::warn!(%player_id, %room_id, "matched player has no connection");
            continue;
        };

        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        match rooms.join_room(player, room_id, relay_tx).await {
            Ok(()) => {
                spawn_room_relay(room_id, relay_rx, out.clone());
                let _ = out.send(Outbound::System(SystemMessage::RoomJoined {
                    room_id,
                    game: GameKind::Ludo,
                }));
            }
            Err(e) => {
                tracing::warn!(%player_id, %room_id, error = %e, "failed to seat player");
            }
        }
    }
}

/// Sends the current queue composition to every queued human.
async fn broadcast_queue_update<I: IdentityProvider>(
    state: &Arc<ServerState<I>>,
    players: &[PlayerProfile],
    needed: usize,
) {
    let msg = SystemMessage::QueueUpdate {
        players: players.to_vec(),
        count: players.len(),
        needed,
    };
    state.registry.broadcast_system(players, msg).await;
}

/// Spawns the relay that turns one room membership's events into wire
/// messages. Ends when the room drops the channel (room destroyed or
/// player removed) or the connection's pump is gone.
fn spawn_room_relay<G: GameLogic>(
    room_id: RoomId,
    mut events: mpsc::UnboundedReceiver<RoomOutbound<G>>,
    out: OutboundSender,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let item = match event {
                RoomOutbound::State(snapshot) => {
                    match JsonCodec.encode(&snapshot) {
                        Ok(data) => Outbound::System(
                            SystemMessage::RoomState { data },
                        ),
                        Err(e) => {
                            tracing::warn!(%room_id, error = %e, "snapshot encode failed");
                            continue;
                        }
                    }
                }
                RoomOutbound::Message(msg) => match JsonCodec.encode(&msg) {
                    Ok(bytes) => Outbound::Game(bytes),
                    Err(e) => {
                        tracing::warn!(%room_id, error = %e, "game message encode failed");
                        continue;
                    }
                },
                RoomOutbound::Joined(player) => Outbound::System(
                    SystemMessage::PlayerJoined { room_id, player },
                ),
                RoomOutbound::Left { player, mid_game } => {
                    let reason =
                        if mid_game { "opponent_left" } else { "left" };
                    Outbound::System(SystemMessage::PlayerLeft {
                        room_id,
                        player_id: player,
                        reason: reason.into(),
                    })
                }
                RoomOutbound::Started => {
                    Outbound::System(SystemMessage::GameStart { room_id })
                }
            };
            if out.send(item).is_err() {
                break;
            }
        }
    });
}

/// Drains a connection's outbound channel into its socket, framing
/// each item in an envelope with a monotonic per-connection sequence.
async fn outbound_pump<Conn: Connection>(
    conn: Conn,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    started_at: Instant,
) {
    let mut seq: u64 = 0;
    while let Some(item) = rx.recv().await {
        let payload = match item {
            Outbound::System(msg) => Payload::System(msg),
            Outbound::Game(bytes) => Payload::Game(bytes),
        };
        seq += 1;
        let envelope = Envelope {
            seq,
            timestamp: started_at.elapsed().as_millis() as u64,
            channel: Channel::default(),
            payload,
        };
        let bytes = match JsonCodec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "envelope encode failed");
                continue;
            }
        };
        if conn.send(&bytes).await.is_err() {
            break;
        }
    }
}

/// Sends a system message directly on the socket, bypassing the pump.
/// Only used before the pump exists (handshake rejections).
async fn send_now<I: IdentityProvider>(
    conn: &impl Connection,
    state: &ServerState<I>,
    msg: SystemMessage,
) {
    let envelope = Envelope {
        seq: 1,
        timestamp: state.now_ms(),
        channel: Channel::default(),
        payload: Payload::System(msg),
    };
    if let Ok(bytes) = JsonCodec.encode(&envelope) {
        let _ = conn.send(&bytes).await;
    }
}

fn send_system(out: &OutboundSender, msg: SystemMessage) {
    let _ = out.send(Outbound::System(msg));
}

fn send_error(out: &OutboundSender, code: u16, message: &str) {
    send_system(
        out,
        SystemMessage::Error {
            code,
            message: message.into(),
        },
    );
}

fn send_room_error(out: &OutboundSender, err: &RoomError) {
    send_error(out, room_error_code(err), &err.to_string());
}

/// Maps room errors to HTTP-convention codes for the wire.
fn room_error_code(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_) => 404,
        RoomError::RoomFull(_)
        | RoomError::AlreadyInRoom(..)
        | RoomError::InvalidState(_) => 409,
        RoomError::NotInRoom(..) => 400,
        RoomError::Unavailable(_) => 503,
    }
}
