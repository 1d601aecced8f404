//! Ludo turn logic wired into the room framework.

use std::collections::VecDeque;
use std::time::Duration;

use gamehub_protocol::{GameKind, PlayerId, PlayerProfile, Recipient};
use gamehub_room::{BotTurn, GameLogic, RoomConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{self, Piece, PIECES_PER_PLAYER};
use crate::bot;

/// Rolling history log cap. Oldest entries fall off first.
pub const HISTORY_CAP: usize = 50;

/// Ludo game settings.
#[derive(Debug, Clone)]
pub struct LudoConfig {
    /// Countdown between match formation and the first turn, giving
    /// clients time to render the "match found" screen.
    pub start_delay: Duration,
    /// How long a bot "thinks" before acting.
    pub bot_delay: Duration,
}

impl Default for LudoConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_secs(5),
            bot_delay: Duration::from_secs(1),
        }
    }
}

/// Seat colors, assigned by seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub fn of_seat(seat: usize) -> Self {
        match seat % 4 {
            0 => Self::Red,
            1 => Self::Green,
            2 => Self::Yellow,
            _ => Self::Blue,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

/// One seat at the table, in turn order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub player: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub color: Color,
}

/// One entry in the bounded audit/replay log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEntry {
    DiceRolled { seat: usize, value: u8 },
    PieceMoved { seat: usize, piece: u8, to: i8 },
    Captured { owner: usize, piece: u8 },
    TurnPassed { seat: usize },
}

/// The full Ludo game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LudoState {
    /// Seats in turn order (queue join order).
    pub seats: Vec<Seat>,
    /// All pieces, seat-major: piece `n` of seat `s` is at
    /// `s * PIECES_PER_PLAYER + n`.
    pub pieces: Vec<Piece>,
    /// Seat index whose turn it is.
    pub current_turn: usize,
    /// A rolled die waiting for its move, if any.
    pub pending_dice: Option<u8>,
    /// Winning seat once decided.
    pub winner: Option<usize>,
    /// Set when the game ended abnormally (a player left mid-game).
    pub terminated: bool,
    /// Bounded rolling log for audit/UI replay.
    pub history: VecDeque<HistoryEntry>,
}

impl LudoState {
    /// Seat index of a player, if seated.
    pub fn seat_of(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.player == player)
    }

    pub(crate) fn push_history(&mut self, entry: HistoryEntry) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    /// Advances to the next seat that still has unfinished pieces.
    fn advance_turn(&mut self) {
        for _ in 0..self.seats.len() {
            self.current_turn = (self.current_turn + 1) % self.seats.len();
            if board::has_unfinished(&self.pieces, self.current_turn) {
                return;
            }
            self.push_history(HistoryEntry::TurnPassed {
                seat: self.current_turn,
            });
        }
    }
}

/// What Ludo clients can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LudoClientMessage {
    RollDice,
    MovePiece { piece: u8, dice: u8 },
}

/// Why a Ludo request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum LudoMoveError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("you already rolled; move a piece")]
    AlreadyRolled,
    #[error("roll the dice first")]
    NoPendingRoll,
    #[error("dice value does not match the pending roll")]
    DiceMismatch,
    #[error("that piece cannot make this move")]
    IllegalMove,
}

/// What the server sends to Ludo clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LudoServerMessage {
    DiceRolled {
        seat: usize,
        value: u8,
        can_move: bool,
    },
    TurnUpdate {
        pieces: Vec<Piece>,
        current_turn: usize,
    },
    PieceCaptured {
        owner: usize,
        piece: u8,
    },
    MoveRejected {
        reason: LudoMoveError,
    },
    GameEnd {
        winner: PlayerId,
        winner_name: String,
        color: Color,
    },
    GameTerminated {
        reason: String,
    },
}

/// The Ludo game, plugged into the room framework.
pub struct LudoGame;

impl LudoGame {
    /// Executes a validated move: apply, capture, win check, turn
    /// advance. Shared by human and bot paths so the rules can't drift.
    pub(crate) fn perform_move(
        state: &mut LudoState,
        seat: usize,
        piece_index: usize,
        dice: u8,
    ) -> Vec<(Recipient, LudoServerMessage)> {
        let mut msgs = Vec::new();

        board::apply_move(&mut state.pieces[piece_index], dice);
        let moved = state.pieces[piece_index];
        state.push_history(HistoryEntry::PieceMoved {
            seat,
            piece: moved.number,
            to: moved.position,
        });

        for (owner, piece) in board::check_captures(&mut state.pieces) {
            state.push_history(HistoryEntry::Captured { owner, piece });
            msgs.push((
                Recipient::All,
                LudoServerMessage::PieceCaptured { owner, piece },
            ));
        }

        if board::check_win(&state.pieces, seat) {
            state.winner = Some(seat);
            let winner = &state.seats[seat];
            tracing::info!(player = %winner.player, color = %winner.color, "ludo game won");
            msgs.push((
                Recipient::All,
                LudoServerMessage::GameEnd {
                    winner: winner.player,
                    winner_name: winner.name.clone(),
                    color: winner.color,
                },
            ));
        } else {
            state.advance_turn();
        }

        msgs.push((
            Recipient::All,
            LudoServerMessage::TurnUpdate {
                pieces: state.pieces.clone(),
                current_turn: state.current_turn,
            },
        ));
        msgs
    }

    /// Rolls for `seat` and either arms a pending move or passes the
    /// turn when nothing is movable.
    pub(crate) fn perform_roll(
        state: &mut LudoState,
        seat: usize,
        value: u8,
    ) -> Vec<(Recipient, LudoServerMessage)> {
        state.push_history(HistoryEntry::DiceRolled { seat, value });
        let legal = board::legal_pieces(&state.pieces, seat, value);

        let mut msgs = vec![(
            Recipient::All,
            LudoServerMessage::DiceRolled {
                seat,
                value,
                can_move: !legal.is_empty(),
            },
        )];

        if legal.is_empty() {
            state.advance_turn();
            msgs.push((
                Recipient::All,
                LudoServerMessage::TurnUpdate {
                    pieces: state.pieces.clone(),
                    current_turn: state.current_turn,
                },
            ));
        } else {
            state.pending_dice = Some(value);
        }
        msgs
    }
}

fn roll_die() -> u8 {
    rand::rng().random_range(1..=6)
}

impl GameLogic for LudoGame {
    type Config = LudoConfig;
    type State = LudoState;
    type ClientMessage = LudoClientMessage;
    type ServerMessage = LudoServerMessage;

    fn kind() -> GameKind {
        GameKind::Ludo
    }

    fn init(_config: &LudoConfig, players: &[PlayerProfile]) -> LudoState {
        let seats: Vec<Seat> = players
            .iter()
            .enumerate()
            .map(|(i, p)| Seat {
                player: p.id,
                name: p.display_name.clone(),
                is_bot: p.is_bot,
                color: Color::of_seat(i),
            })
            .collect();
        let pieces = board::initial_pieces(seats.len());
        LudoState {
            seats,
            pieces,
            current_turn: 0,
            pending_dice: None,
            winner: None,
            terminated: false,
            history: VecDeque::new(),
        }
    }

    fn validate_message(
        state: &LudoState,
        sender: PlayerId,
        msg: &LudoClientMessage,
    ) -> Result<(), LudoServerMessage> {
        let reject = |reason| LudoServerMessage::MoveRejected { reason };

        let seat = state
            .seat_of(sender)
            .ok_or_else(|| reject(LudoMoveError::NotYourTurn))?;
        if seat != state.current_turn {
            return Err(reject(LudoMoveError::NotYourTurn));
        }

        match msg {
            LudoClientMessage::RollDice => {
                if state.pending_dice.is_some() {
                    return Err(reject(LudoMoveError::AlreadyRolled));
                }
            }
            LudoClientMessage::MovePiece { piece, dice } => {
                let pending = state
                    .pending_dice
                    .ok_or_else(|| reject(LudoMoveError::NoPendingRoll))?;
                if *dice != pending {
                    return Err(reject(LudoMoveError::DiceMismatch));
                }
                if *piece as usize >= PIECES_PER_PLAYER {
                    return Err(reject(LudoMoveError::IllegalMove));
                }
                let index =
                    seat * PIECES_PER_PLAYER + *piece as usize;
                if !board::can_move(&state.pieces[index], pending) {
                    return Err(reject(LudoMoveError::IllegalMove));
                }
            }
        }
        Ok(())
    }

    fn handle_message(
        state: &mut LudoState,
        sender: PlayerId,
        msg: LudoClientMessage,
    ) -> Vec<(Recipient, LudoServerMessage)> {
        // validate_message established the seat and the move's legality.
        let Some(seat) = state.seat_of(sender) else {
            return Vec::new();
        };

        match msg {
            LudoClientMessage::RollDice => {
                Self::perform_roll(state, seat, roll_die())
            }
            LudoClientMessage::MovePiece { piece, dice } => {
                state.pending_dice = None;
                let index = seat * PIECES_PER_PLAYER + piece as usize;
                Self::perform_move(state, seat, index, dice)
            }
        }
    }

    fn is_finished(state: &LudoState) -> bool {
        state.winner.is_some() || state.terminated
    }

    fn winner(state: &LudoState) -> Option<PlayerId> {
        state.winner.map(|seat| state.seats[seat].player)
    }

    fn bot_turn(config: &LudoConfig, state: &LudoState) -> Option<BotTurn> {
        if Self::is_finished(state) {
            return None;
        }
        let seat = &state.seats[state.current_turn];
        seat.is_bot.then_some(BotTurn {
            seat: seat.player,
            delay: config.bot_delay,
        })
    }

    fn bot_act(
        _config: &LudoConfig,
        state: &mut LudoState,
        seat: PlayerId,
    ) -> Vec<(Recipient, LudoServerMessage)> {
        let Some(seat) = state.seat_of(seat) else {
            return Vec::new();
        };
        bot::take_turn(state, seat)
    }

    fn on_player_disconnect(
        state: &mut LudoState,
        player: PlayerId,
    ) -> Vec<(Recipient, LudoServerMessage)> {
        if Self::is_finished(state) || state.seat_of(player).is_none() {
            return Vec::new();
        }
        state.terminated = true;
        vec![(
            Recipient::All,
            LudoServerMessage::GameTerminated {
                reason: "opponent_left".to_string(),
            },
        )]
    }

    fn room_config(config: &LudoConfig) -> RoomConfig {
        RoomConfig {
            min_players: 4,
            max_players: 4,
            start_delay: config.start_delay,
            private: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceStatus;

    fn profiles() -> Vec<PlayerProfile> {
        let mut out: Vec<PlayerProfile> = (1..=2)
            .map(|id| PlayerProfile {
                id: PlayerId(id),
                display_name: format!("player-{id}"),
                college_id: "college-1".into(),
                is_bot: false,
            })
            .collect();
        out.push(PlayerProfile::bot(PlayerId(100), "Astra"));
        out.push(PlayerProfile::bot(PlayerId(101), "Blitz"));
        out
    }

    fn fresh_state() -> LudoState {
        LudoGame::init(&LudoConfig::default(), &profiles())
    }

    /// Checks the cross-move invariants from the rules: positions in
    /// range, home/finished exclusivity, win iff all four finished.
    fn assert_invariants(state: &LudoState) {
        for p in &state.pieces {
            assert!((-1..=board::LAST_CELL).contains(&p.position));
            if p.status == PieceStatus::OnPath {
                assert!(p.position >= 0);
            } else {
                assert_eq!(p.position, -1);
            }
        }
        for seat in 0..state.seats.len() {
            let all_finished = state
                .pieces
                .iter()
                .filter(|p| p.owner == seat)
                .all(|p| p.status == PieceStatus::Finished);
            assert_eq!(
                board::check_win(&state.pieces, seat),
                all_finished
            );
        }
    }

    #[test]
    fn test_init_seats_in_join_order_with_colors() {
        let state = fresh_state();

        assert_eq!(state.seats.len(), 4);
        assert_eq!(state.seats[0].player, PlayerId(1));
        assert_eq!(state.seats[1].player, PlayerId(2));
        assert!(state.seats[2].is_bot);
        assert_eq!(state.seats[0].color, Color::Red);
        assert_eq!(state.seats[3].color, Color::Blue);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.pieces.len(), 16);
        assert!(state
            .pieces
            .iter()
            .all(|p| p.status == PieceStatus::Home));
    }

    #[test]
    fn test_validate_rejects_out_of_turn_roll() {
        let state = fresh_state();

        let result = LudoGame::validate_message(
            &state,
            PlayerId(2),
            &LudoClientMessage::RollDice,
        );

        assert!(matches!(
            result,
            Err(LudoServerMessage::MoveRejected {
                reason: LudoMoveError::NotYourTurn
            })
        ));
    }

    #[test]
    fn test_validate_rejects_move_without_roll() {
        let state = fresh_state();

        let result = LudoGame::validate_message(
            &state,
            PlayerId(1),
            &LudoClientMessage::MovePiece { piece: 0, dice: 6 },
        );

        assert!(matches!(
            result,
            Err(LudoServerMessage::MoveRejected {
                reason: LudoMoveError::NoPendingRoll
            })
        ));
    }

    #[test]
    fn test_validate_rejects_dice_mismatch() {
        let mut state = fresh_state();
        state.pending_dice = Some(6);

        let result = LudoGame::validate_message(
            &state,
            PlayerId(1),
            &LudoClientMessage::MovePiece { piece: 0, dice: 3 },
        );

        assert!(matches!(
            result,
            Err(LudoServerMessage::MoveRejected {
                reason: LudoMoveError::DiceMismatch
            })
        ));
    }

    #[test]
    fn test_validate_rejects_illegal_piece() {
        let mut state = fresh_state();
        // A 3 can't move a home piece.
        state.pending_dice = Some(3);

        let result = LudoGame::validate_message(
            &state,
            PlayerId(1),
            &LudoClientMessage::MovePiece { piece: 0, dice: 3 },
        );

        assert!(matches!(
            result,
            Err(LudoServerMessage::MoveRejected {
                reason: LudoMoveError::IllegalMove
            })
        ));
    }

    #[test]
    fn test_roll_with_no_legal_move_passes_turn() {
        let mut state = fresh_state();

        // All pieces home; a non-6 roll has no legal move.
        let msgs = LudoGame::perform_roll(&mut state, 0, 3);

        assert!(msgs.iter().any(|(_, m)| matches!(
            m,
            LudoServerMessage::DiceRolled {
                seat: 0,
                value: 3,
                can_move: false
            }
        )));
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.pending_dice, None);
        assert_invariants(&state);
    }

    #[test]
    fn test_roll_with_legal_move_arms_pending_dice() {
        let mut state = fresh_state();

        let msgs = LudoGame::perform_roll(&mut state, 0, 6);

        assert!(msgs.iter().any(|(_, m)| matches!(
            m,
            LudoServerMessage::DiceRolled {
                seat: 0,
                value: 6,
                can_move: true
            }
        )));
        assert_eq!(state.pending_dice, Some(6));
        assert_eq!(state.current_turn, 0, "turn waits for the move");
    }

    #[test]
    fn test_move_enters_path_and_advances_turn() {
        let mut state = fresh_state();
        state.pending_dice = Some(6);

        state.pending_dice = None;
        let msgs = LudoGame::perform_move(&mut state, 0, 0, 6);

        assert_eq!(state.pieces[0].status, PieceStatus::OnPath);
        assert_eq!(state.pieces[0].position, 0);
        assert_eq!(state.current_turn, 1);
        assert!(msgs.iter().any(|(_, m)| matches!(
            m,
            LudoServerMessage::TurnUpdate { current_turn: 1, .. }
        )));
        assert_invariants(&state);
    }

    #[test]
    fn test_move_landing_on_opponent_captures_both() {
        let mut state = fresh_state();
        // Seat 0 piece 0 at cell 10, seat 1 piece 0 at cell 13.
        state.pieces[0].status = PieceStatus::OnPath;
        state.pieces[0].position = 10;
        state.pieces[4].status = PieceStatus::OnPath;
        state.pieces[4].position = 13;

        let msgs = LudoGame::perform_move(&mut state, 0, 0, 3);

        assert_eq!(state.pieces[0].status, PieceStatus::Home);
        assert_eq!(state.pieces[4].status, PieceStatus::Home);
        let captures = msgs
            .iter()
            .filter(|(_, m)| {
                matches!(m, LudoServerMessage::PieceCaptured { .. })
            })
            .count();
        assert_eq!(captures, 2, "capture is mutual");
        assert_invariants(&state);
    }

    #[test]
    fn test_last_piece_finishing_wins_game() {
        let mut state = fresh_state();
        // Seat 2: three pieces already finished, the last at cell 49.
        for n in 0..3 {
            let p = &mut state.pieces[2 * PIECES_PER_PLAYER + n];
            p.status = PieceStatus::Finished;
            p.position = -1;
        }
        let last = 2 * PIECES_PER_PLAYER + 3;
        state.pieces[last].status = PieceStatus::OnPath;
        state.pieces[last].position = 49;
        state.current_turn = 2;

        let msgs = LudoGame::perform_move(&mut state, 2, last, 2);

        assert_eq!(state.winner, Some(2));
        assert!(LudoGame::is_finished(&state));
        assert_eq!(LudoGame::winner(&state), Some(PlayerId(100)));
        assert!(msgs.iter().any(|(_, m)| matches!(
            m,
            LudoServerMessage::GameEnd {
                winner: PlayerId(100),
                color: Color::Yellow,
                ..
            }
        )));
        assert_invariants(&state);
    }

    #[test]
    fn test_advance_turn_skips_finished_players() {
        let mut state = fresh_state();
        // Seat 1 fully finished — should never get a turn.
        for n in 0..PIECES_PER_PLAYER {
            let p = &mut state.pieces[PIECES_PER_PLAYER + n];
            p.status = PieceStatus::Finished;
            p.position = -1;
        }
        state.current_turn = 0;

        state.advance_turn();

        assert_eq!(state.current_turn, 2, "finished seat is skipped");
    }

    #[test]
    fn test_bot_turn_reports_bot_seats_only() {
        let config = LudoConfig::default();
        let mut state = fresh_state();

        assert!(
            LudoGame::bot_turn(&config, &state).is_none(),
            "seat 0 is human"
        );

        state.current_turn = 2;
        let bot_turn = LudoGame::bot_turn(&config, &state)
            .expect("seat 2 is a bot");
        assert_eq!(bot_turn.seat, PlayerId(100));
        assert_eq!(bot_turn.delay, config.bot_delay);
    }

    #[test]
    fn test_disconnect_terminates_active_game() {
        let mut state = fresh_state();

        let msgs = LudoGame::on_player_disconnect(&mut state, PlayerId(2));

        assert!(state.terminated);
        assert!(LudoGame::is_finished(&state));
        assert_eq!(LudoGame::winner(&state), None);
        assert!(msgs.iter().any(|(_, m)| matches!(
            m,
            LudoServerMessage::GameTerminated { reason } if reason == "opponent_left"
        )));
    }

    #[test]
    fn test_history_is_capped() {
        let mut state = fresh_state();

        for _ in 0..(HISTORY_CAP + 25) {
            state.push_history(HistoryEntry::DiceRolled {
                seat: 0,
                value: 1,
            });
        }

        assert_eq!(state.history.len(), HISTORY_CAP);
    }

    #[test]
    fn test_room_config_four_players_with_countdown() {
        let config = LudoConfig::default();
        let room = LudoGame::room_config(&config);
        assert_eq!(room.min_players, 4);
        assert_eq!(room.max_players, 4);
        assert_eq!(room.start_delay, Duration::from_secs(5));
        assert!(!room.private);
    }

    #[test]
    fn test_client_message_json_shape() {
        let msg = LudoClientMessage::MovePiece { piece: 2, dice: 6 };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"move_piece","piece":2,"dice":6}"#
        );
    }
}
