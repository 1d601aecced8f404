//! Room actor: an isolated Tokio task that owns a game instance.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model" — no shared
//! mutable state, just message passing. Timers (start countdown, bot
//! delays) are spawned tasks that post commands back into the same
//! channel, so the actor re-checks its state when they fire instead of
//! trusting a possibly stale timer.

use std::collections::HashMap;
use std::sync::Arc;

use gamehub_protocol::{PlayerId, PlayerProfile, Recipient, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::sink::{MatchOutcome, MatchSummary, ResultSink};
use crate::{GameLogic, RoomConfig, RoomError, RoomState};

/// An outbound message from the room actor to a player's connection handler.
#[derive(Debug)]
pub enum RoomOutbound<G: GameLogic> {
    /// Full game state snapshot (sent on game start).
    State(G::State),
    /// A game message from the game logic.
    Message(G::ServerMessage),
    /// A player (or bot) was seated in the room.
    Joined(PlayerProfile),
    /// A player left the room. `mid_game` is set when the departure
    /// interrupted a game in progress.
    Left { player: PlayerId, mid_game: bool },
    /// The start countdown elapsed; the game is now running.
    Started,
}

impl<G: GameLogic> Clone for RoomOutbound<G> {
    fn clone(&self) -> Self {
        match self {
            Self::State(s) => Self::State(s.clone()),
            Self::Message(m) => Self::Message(m.clone()),
            Self::Joined(p) => Self::Joined(p.clone()),
            Self::Left { player, mid_game } => Self::Left {
                player: *player,
                mid_game: *mid_game,
            },
            Self::Started => Self::Started,
        }
    }
}

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender<G> = mpsc::UnboundedSender<RoomOutbound<G>>;

/// Commands sent to a room actor through its channel.
///
/// Each variant represents an operation the outside world can request.
/// The `oneshot::Sender` in some variants is a "reply channel" — the
/// caller sends a command and waits for the response on that channel.
/// `StartTimeout` and `BotAct` come from the room's own timer tasks.
pub(crate) enum RoomCommand<G: GameLogic> {
    /// Seat a human player in the room.
    Join {
        profile: PlayerProfile,
        sender: PlayerSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Seat a bot in the room. Bots have no outbound channel.
    JoinBot {
        profile: PlayerProfile,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player from the room. Replies with `true` when no
    /// humans remain, so the manager can destroy the room.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<bool, RoomError>>,
    },

    /// Deliver a game message from a player.
    Message {
        sender: PlayerId,
        msg: G::ClientMessage,
    },

    /// Request the current room state.
    GetState {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// The start countdown elapsed.
    StartTimeout,

    /// A scheduled bot delay elapsed.
    BotAct { seat: PlayerId },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Current lifecycle state.
    pub state: RoomState,
    /// Number of players currently seated (bots included).
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
    /// Private rooms are hidden from matchmaking and listings.
    pub private: bool,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// This is cheap to clone — it's just an `mpsc::Sender` wrapper.
/// The `RoomManager` holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle<G: GameLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: GameLogic> RoomHandle<G> {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        profile: PlayerProfile,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                profile,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Seats a bot in the room.
    pub async fn join_bot(
        &self,
        profile: PlayerProfile,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::JoinBot {
                profile,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a leave request to the room. Returns `true` when the room
    /// has no human players left and should be destroyed.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a game message to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetState { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<G: GameLogic> {
    room_id: RoomId,
    state: RoomState,
    config: RoomConfig,
    /// Seated players in join order. Join order defines turn order.
    players: Vec<PlayerProfile>,
    /// Per-player outbound channels. Bots have none.
    senders: HashMap<PlayerId, PlayerSender<G>>,
    game_state: Option<G::State>,
    game_config: G::Config,
    receiver: mpsc::Receiver<RoomCommand<G>>,
    /// Clone of our own command sender, handed to timer tasks.
    self_tx: mpsc::Sender<RoomCommand<G>>,
    sink: Arc<dyn ResultSink>,
    /// Which bot seat has a pending delay timer, if any.
    bot_scheduled: Option<PlayerId>,
    reported: bool,
}

impl<G: GameLogic> RoomActor<G> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    profile,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(profile, Some(sender));
                    let _ = reply.send(result);
                }
                RoomCommand::JoinBot { profile, reply } => {
                    let result = self.handle_join(profile, None);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(player_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Message { sender, msg } => {
                    self.handle_message(sender, msg);
                }
                RoomCommand::GetState { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::StartTimeout => {
                    self.handle_start_timeout();
                }
                RoomCommand::BotAct { seat } => {
                    self.handle_bot_act(seat);
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    self.state = RoomState::Destroying;
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        profile: PlayerProfile,
        sender: Option<PlayerSender<G>>,
    ) -> Result<(), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.state
            )));
        }
        let player_id = profile.id;
        if self.players.iter().any(|p| p.id == player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }

        self.players.push(profile.clone());
        if let Some(sender) = sender {
            self.senders.insert(player_id, sender);
        }
        self.broadcast(RoomOutbound::Joined(profile));
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        // Begin the start countdown once the minimum is seated.
        if self.players.len() >= self.config.min_players {
            self.begin_countdown();
        }

        Ok(())
    }

    fn handle_leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<bool, RoomError> {
        let Some(pos) = self.players.iter().position(|p| p.id == player_id)
        else {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        };
        self.players.remove(pos);
        self.senders.remove(&player_id);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        self.broadcast(RoomOutbound::Left {
            player: player_id,
            mid_game: self.state == RoomState::InProgress,
        });

        // Let the game react (end early, skip the seat, ...).
        if self.state.is_active() {
            if let Some(game_state) = &mut self.game_state {
                let msgs = G::on_player_disconnect(game_state, player_id);
                self.dispatch(msgs);
            }
            self.check_finished(MatchOutcome::Abandoned);
            self.maybe_schedule_bot();
        }

        let humans_left = self.players.iter().any(|p| !p.is_bot);
        Ok(!humans_left)
    }

    fn handle_message(
        &mut self,
        sender: PlayerId,
        msg: G::ClientMessage,
    ) {
        if !self.players.iter().any(|p| p.id == sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }
        if self.state != RoomState::InProgress {
            tracing::debug!(
                room_id = %self.room_id,
                %sender,
                state = %self.state,
                "game message outside InProgress, ignoring"
            );
            return;
        }

        let game_state = match &mut self.game_state {
            Some(s) => s,
            None => return,
        };

        // A rejected message goes back to the offender only, never to
        // the other players, and leaves the state untouched.
        if let Err(rejection) = G::validate_message(game_state, sender, &msg)
        {
            tracing::debug!(
                room_id = %self.room_id,
                %sender,
                "message validation failed"
            );
            self.send_to(sender, RoomOutbound::Message(rejection));
            return;
        }

        let msgs = G::handle_message(game_state, sender, msg);

        // Dispatch after releasing the mutable borrow on game_state.
        self.dispatch(msgs);
        self.check_finished(MatchOutcome::Completed);
        self.maybe_schedule_bot();
    }

    fn begin_countdown(&mut self) {
        self.state = RoomState::Starting;
        if self.config.start_delay.is_zero() {
            self.start_game();
            return;
        }

        tracing::info!(
            room_id = %self.room_id,
            delay = ?self.config.start_delay,
            "start countdown began"
        );

        let tx = self.self_tx.clone();
        let delay = self.config.start_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomCommand::StartTimeout).await;
        });
    }

    fn handle_start_timeout(&mut self) {
        // Stale timer: the room may have emptied out and finished while
        // the countdown was running.
        if self.state != RoomState::Starting {
            return;
        }
        self.start_game();
    }

    fn start_game(&mut self) {
        self.game_state =
            Some(G::init(&self.game_config, &self.players));
        self.state = RoomState::InProgress;
        tracing::info!(
            room_id = %self.room_id,
            players = self.players.len(),
            "game started"
        );

        self.broadcast(RoomOutbound::Started);
        if let Some(game_state) = &self.game_state {
            self.broadcast(RoomOutbound::State(game_state.clone()));
        }
        self.maybe_schedule_bot();
    }

    fn handle_bot_act(&mut self, seat: PlayerId) {
        if self.bot_scheduled == Some(seat) {
            self.bot_scheduled = None;
        }
        if self.state != RoomState::InProgress {
            return;
        }
        let game_state = match &mut self.game_state {
            Some(s) => s,
            None => return,
        };
        // Only act if the game is still waiting on this exact seat.
        if G::bot_turn(&self.game_config, game_state).map(|bt| bt.seat)
            != Some(seat)
        {
            return;
        }

        let msgs = G::bot_act(&self.game_config, game_state, seat);
        self.dispatch(msgs);
        self.check_finished(MatchOutcome::Completed);
        self.maybe_schedule_bot();
    }

    /// Schedules a delay timer for the bot seat the game is waiting on,
    /// unless one is already pending for it.
    fn maybe_schedule_bot(&mut self) {
        if self.state != RoomState::InProgress {
            return;
        }
        let Some(game_state) = &self.game_state else { return };
        let Some(bot_turn) = G::bot_turn(&self.game_config, game_state)
        else {
            return;
        };
        if self.bot_scheduled == Some(bot_turn.seat) {
            return;
        }

        self.bot_scheduled = Some(bot_turn.seat);
        let tx = self.self_tx.clone();
        let seat = bot_turn.seat;
        let delay = bot_turn.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomCommand::BotAct { seat }).await;
        });
    }

    /// Transitions to Finished and reports the result exactly once.
    fn check_finished(&mut self, outcome: MatchOutcome) {
        let Some(game_state) = &self.game_state else { return };
        if !G::is_finished(game_state) {
            return;
        }
        if self.state == RoomState::InProgress {
            self.state = RoomState::Finished;
            tracing::info!(room_id = %self.room_id, "game finished");
        }
        if !self.reported {
            self.reported = true;
            self.sink.record(MatchSummary {
                room_id: self.room_id,
                game: G::kind(),
                participants: self.players.clone(),
                winner: G::winner(game_state),
                outcome,
            });
        }
    }

    /// Dispatches outbound messages to the correct recipients.
    fn dispatch(&self, msgs: Vec<(Recipient, G::ServerMessage)>) {
        for (recipient, msg) in msgs {
            let outbound = RoomOutbound::Message(msg);
            match recipient {
                Recipient::All => {
                    for p in &self.players {
                        self.send_to(p.id, outbound.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, outbound);
                }
                Recipient::AllExcept(excluded) => {
                    for p in &self.players {
                        if p.id != excluded {
                            self.send_to(p.id, outbound.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an outbound message to every seated player.
    fn broadcast(&self, msg: RoomOutbound<G>) {
        for p in &self.players {
            self.send_to(p.id, msg.clone());
        }
    }

    /// Sends an outbound message to a single player. Silently drops for
    /// bots (no channel) and gone receivers (player disconnected).
    fn send_to(&self, player_id: PlayerId, msg: RoomOutbound<G>) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            state: self.state,
            player_count: self.players.len(),
            max_players: self.config.max_players,
            private: self.config.private,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure — if the channel fills up,
/// senders will wait (bounded channel).
pub(crate) fn spawn_room<G: GameLogic>(
    room_id: RoomId,
    config: RoomConfig,
    game_config: G::Config,
    channel_size: usize,
    sink: Arc<dyn ResultSink>,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor::<G> {
        room_id,
        state: RoomState::WaitingForPlayers,
        config,
        players: Vec::new(),
        senders: HashMap::new(),
        game_state: None,
        game_config,
        receiver: rx,
        self_tx: tx.clone(),
        sink,
        bot_scheduled: None,
        reported: false,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
