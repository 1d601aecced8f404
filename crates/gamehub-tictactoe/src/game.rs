//! Tic-tac-toe wired into the room framework.

use std::time::Duration;

use gamehub_protocol::{Difficulty, GameKind, PlayerId, PlayerProfile, Recipient};
use gamehub_room::{BotTurn, GameLogic, RoomConfig};
use serde::{Deserialize, Serialize};

use crate::rules::{self, Board, Mark};
use crate::strategy::BotStrategy;

/// Tic-tac-toe game settings.
#[derive(Debug, Clone, Default)]
pub struct TicTacToeConfig {
    /// `Some` makes this a private solo room against a bot of the
    /// given difficulty. `None` is a public human-vs-human room.
    pub solo: Option<Difficulty>,
    /// How long the bot "thinks" before moving.
    pub bot_delay: BotDelay,
}

/// Newtype so the config can derive `Default` with a non-zero delay.
#[derive(Debug, Clone, Copy)]
pub struct BotDelay(pub Duration);

impl Default for BotDelay {
    fn default() -> Self {
        Self(Duration::from_secs(1))
    }
}

/// One seat: the first player to join is always X (first mover), the
/// second always O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub player: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub mark: Mark,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Win { mark: Mark },
    Draw,
}

/// The full tic-tac-toe game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicTacToeState {
    pub board: Board,
    pub current_turn: Mark,
    pub seats: Vec<Seat>,
    pub solo: bool,
    /// Bot difficulty; only meaningful in solo games.
    pub difficulty: Difficulty,
    pub outcome: Option<Outcome>,
    /// Set when the game ended abnormally (opponent left).
    pub terminated: bool,
}

impl TicTacToeState {
    /// The seat holding `mark`.
    pub fn seat_with_mark(&self, mark: Mark) -> Option<&Seat> {
        self.seats.iter().find(|s| s.mark == mark)
    }

    fn seat_of(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player == player)
    }
}

/// What tic-tac-toe clients can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicTacToeClientMessage {
    /// Place `mark` at `cell` (0–8, row-major). The mark is submitted
    /// explicitly so a stale client can be told its symbol is wrong.
    Place { cell: usize, mark: Mark },
    /// Start over on a fresh board with the same players. Only valid
    /// mid-game; a decided game ends the room.
    Reset,
}

/// Why a move was rejected. The three conditions are checked and
/// surfaced independently so a client can tell "not your turn" from
/// "square occupied".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum MoveError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("that is not your symbol")]
    InvalidSymbol,
    #[error("cell is occupied or out of range")]
    Occupied,
}

/// What the server sends to tic-tac-toe clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicTacToeServerMessage {
    BoardUpdate {
        board: Board,
        current_turn: Mark,
    },
    MoveRejected {
        reason: MoveError,
    },
    GameOver {
        outcome: Outcome,
        board: Board,
    },
    BoardReset {
        board: Board,
        current_turn: Mark,
    },
    GameTerminated {
        reason: String,
    },
}

/// The tic-tac-toe game, plugged into the room framework.
pub struct TicTacToeGame;

impl TicTacToeGame {
    /// Applies a validated placement and reports the result. Shared by
    /// the human and bot paths so the win/draw check can't diverge.
    pub(crate) fn place(
        state: &mut TicTacToeState,
        cell: usize,
        mark: Mark,
    ) -> Vec<(Recipient, TicTacToeServerMessage)> {
        state.board[cell] = Some(mark);

        if let Some(winner) = rules::winner(&state.board) {
            state.outcome = Some(Outcome::Win { mark: winner });
            tracing::info!(%winner, "tictactoe game won");
        } else if rules::is_full(&state.board) {
            state.outcome = Some(Outcome::Draw);
        }

        match state.outcome {
            Some(outcome) => vec![(
                Recipient::All,
                TicTacToeServerMessage::GameOver {
                    outcome,
                    board: state.board,
                },
            )],
            None => {
                state.current_turn = state.current_turn.opponent();
                vec![(
                    Recipient::All,
                    TicTacToeServerMessage::BoardUpdate {
                        board: state.board,
                        current_turn: state.current_turn,
                    },
                )]
            }
        }
    }
}

impl GameLogic for TicTacToeGame {
    type Config = TicTacToeConfig;
    type State = TicTacToeState;
    type ClientMessage = TicTacToeClientMessage;
    type ServerMessage = TicTacToeServerMessage;

    fn kind() -> GameKind {
        GameKind::TicTacToe
    }

    fn init(
        config: &TicTacToeConfig,
        players: &[PlayerProfile],
    ) -> TicTacToeState {
        let seats: Vec<Seat> = players
            .iter()
            .zip([Mark::X, Mark::O])
            .map(|(p, mark)| Seat {
                player: p.id,
                name: p.display_name.clone(),
                is_bot: p.is_bot,
                mark,
            })
            .collect();
        TicTacToeState {
            board: [None; 9],
            current_turn: Mark::X,
            seats,
            solo: config.solo.is_some(),
            difficulty: config.solo.unwrap_or_default(),
            outcome: None,
            terminated: false,
        }
    }

    fn validate_message(
        state: &TicTacToeState,
        sender: PlayerId,
        msg: &TicTacToeClientMessage,
    ) -> Result<(), TicTacToeServerMessage> {
        let reject =
            |reason| TicTacToeServerMessage::MoveRejected { reason };

        let TicTacToeClientMessage::Place { cell, mark } = msg else {
            return Ok(());
        };
        let seat = state
            .seat_of(sender)
            .ok_or_else(|| reject(MoveError::NotYourTurn))?;

        if state.current_turn != seat.mark {
            return Err(reject(MoveError::NotYourTurn));
        }
        if *mark != seat.mark {
            return Err(reject(MoveError::InvalidSymbol));
        }
        if *cell >= 9 || state.board[*cell].is_some() {
            return Err(reject(MoveError::Occupied));
        }
        Ok(())
    }

    fn handle_message(
        state: &mut TicTacToeState,
        _sender: PlayerId,
        msg: TicTacToeClientMessage,
    ) -> Vec<(Recipient, TicTacToeServerMessage)> {
        match msg {
            TicTacToeClientMessage::Place { cell, mark } => {
                Self::place(state, cell, mark)
            }
            TicTacToeClientMessage::Reset => {
                state.board = [None; 9];
                state.current_turn = Mark::X;
                vec![(
                    Recipient::All,
                    TicTacToeServerMessage::BoardReset {
                        board: state.board,
                        current_turn: state.current_turn,
                    },
                )]
            }
        }
    }

    fn is_finished(state: &TicTacToeState) -> bool {
        state.outcome.is_some() || state.terminated
    }

    fn winner(state: &TicTacToeState) -> Option<PlayerId> {
        match state.outcome? {
            Outcome::Win { mark } => {
                state.seat_with_mark(mark).map(|s| s.player)
            }
            Outcome::Draw => None,
        }
    }

    fn bot_turn(
        config: &TicTacToeConfig,
        state: &TicTacToeState,
    ) -> Option<BotTurn> {
        if Self::is_finished(state) {
            return None;
        }
        let seat = state.seat_with_mark(state.current_turn)?;
        seat.is_bot.then_some(BotTurn {
            seat: seat.player,
            delay: config.bot_delay.0,
        })
    }

    fn bot_act(
        _config: &TicTacToeConfig,
        state: &mut TicTacToeState,
        seat: PlayerId,
    ) -> Vec<(Recipient, TicTacToeServerMessage)> {
        let Some(seat) = state.seat_of(seat) else {
            return Vec::new();
        };
        let mark = seat.mark;
        let strategy = BotStrategy::from(state.difficulty);
        let Some(cell) = strategy.choose(&state.board, mark) else {
            return Vec::new();
        };
        tracing::debug!(%mark, cell, "bot move");
        Self::place(state, cell, mark)
    }

    fn on_player_disconnect(
        state: &mut TicTacToeState,
        player: PlayerId,
    ) -> Vec<(Recipient, TicTacToeServerMessage)> {
        if Self::is_finished(state) || state.seat_of(player).is_none() {
            return Vec::new();
        }
        state.terminated = true;
        vec![(
            Recipient::All,
            TicTacToeServerMessage::GameTerminated {
                reason: "opponent_left".to_string(),
            },
        )]
    }

    fn room_config(config: &TicTacToeConfig) -> RoomConfig {
        RoomConfig {
            min_players: 2,
            max_players: 2,
            start_delay: Duration::ZERO,
            private: config.solo.is_some(),
        }
    }
}
