//! Core protocol types for Gamehub's wire format.
//!
//! Everything in this module travels "on the wire": these structures are
//! serialized to bytes, sent over the network, and deserialized on the
//! other side. The protocol layer knows nothing about rooms or queues —
//! it only defines the shared language.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a `RoomId` can never be passed where a
/// `PlayerId` is expected. `#[serde(transparent)]` keeps the JSON
/// representation a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Identifiers at or above this value are reserved for synthesized
    /// bot players and never handed out by an identity provider.
    pub const BOT_BASE: u64 = 1 << 62;

    /// Whether this identifier falls in the reserved bot range.
    pub fn is_bot_id(&self) -> bool {
        self.0 >= Self::BOT_BASE
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one match instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Players and games
// ---------------------------------------------------------------------------

/// Which game a room or queue entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Ludo,
    TicTacToe,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ludo => write!(f, "ludo"),
            Self::TicTacToe => write!(f, "tictactoe"),
        }
    }
}

/// Bot difficulty, selected when a player starts a solo match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

/// A player's identity as the engine sees it.
///
/// The identity provider resolves an opaque credential into this profile;
/// the engine never inspects the credential itself. Bots get a profile
/// too — same shape, `is_bot` set — so seating and turn order treat
/// humans and bots uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub display_name: String,
    /// College affiliation, opaque to the engine.
    pub college_id: String,
    pub is_bot: bool,
}

impl PlayerProfile {
    /// Builds a profile for a synthesized bot player.
    pub fn bot(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            college_id: String::new(),
            is_bot: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Game logic returns `(Recipient, ServerMessage)` pairs; this enum tells
/// the room actor WHERE to deliver each one. Rejections go back to the
/// offending player only, board updates to everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Channel — delivery guarantees
// ---------------------------------------------------------------------------

/// The delivery guarantee for a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss. The default for turn-based play.
    #[default]
    ReliableOrdered,
    /// Delivered, but may arrive out of order.
    ReliableUnordered,
    /// May be lost or reordered. Unused by the turn-based games but kept
    /// in the wire format so clients don't break when it appears.
    Unreliable,
}

// ---------------------------------------------------------------------------
// SystemMessage — framework-level messages
// ---------------------------------------------------------------------------

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub game: GameKind,
    pub player_count: usize,
    pub max_players: usize,
}

/// Messages handled by the orchestrator itself, not by game logic.
///
/// Connection lifecycle, matchmaking, and room membership all live here.
/// `#[serde(tag = "type")]` produces internally tagged JSON
/// (`{ "type": "Handshake", ... }`) which is what the web clients parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server: first message on a connection.
    Handshake {
        version: u32,
        credential: Option<String>,
    },

    /// Server → Client: connection accepted, identity resolved.
    HandshakeAck {
        player_id: PlayerId,
        display_name: String,
        server_time: u64,
    },

    /// Either direction: connection is going away.
    Disconnect { reason: String },

    // -- Heartbeat (keep-alive) --
    /// Client → Server, sent every few seconds.
    Heartbeat { client_time: u64 },

    /// Server → Client echo for RTT measurement.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- Matchmaking (Ludo) --
    /// Client → Server: enter the Ludo waitlist.
    JoinQueue,

    /// Client → Server: leave the waitlist.
    LeaveQueue,

    /// Server → every queued client: current waitlist composition.
    QueueUpdate {
        players: Vec<PlayerProfile>,
        count: usize,
        needed: usize,
    },

    // -- Room formation --
    /// Client → Server: first-fit into a waiting Tic-Tac-Toe room, or
    /// create one.
    JoinOrCreate,

    /// Client → Server: start a private solo match against the bot.
    CreateSolo { difficulty: Difficulty },

    /// Client → Server: join a specific room by id.
    JoinRoom { room_id: RoomId },

    /// Client → Server: leave the current room.
    LeaveRoom,

    /// Client → Server: list joinable rooms.
    ListRooms,

    /// Server → Client: the joinable rooms.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: you are now a member of this room.
    RoomJoined { room_id: RoomId, game: GameKind },

    /// Server → room members: a player was seated.
    PlayerJoined {
        room_id: RoomId,
        player: PlayerProfile,
    },

    /// Server → room members: a player left; `reason` is `"left"` or
    /// `"opponent_left"` when the departure terminated an active game.
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
        reason: String,
    },

    /// Server → room members: countdown elapsed, the game is live.
    GameStart { room_id: RoomId },

    /// Server → Client: full game state snapshot, serialized by the
    /// game's codec. Opaque at this layer.
    RoomState { data: Vec<u8> },

    // -- Errors --
    /// Server → Client. `code` follows HTTP conventions (400 bad
    /// request, 401 unauthorized, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload and Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The content of a message: either a system message or game data.
///
/// Adjacently tagged so the orchestrator can cheaply tell "mine" from
/// "pass through to the game" without decoding game bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A framework-level message.
    System(SystemMessage),
    /// Game-specific data, opaque to the framework. These bytes are the
    /// game's `ClientMessage` or `ServerMessage` run through the codec.
    Game(Vec<u8>),
}

/// The top-level wrapper; every message on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing per-side sequence number.
    pub seq: u64,

    /// Milliseconds since the server (or client) started.
    pub timestamp: u64,

    /// Delivery guarantee. Defaults to `ReliableOrdered` when absent.
    #[serde(default)]
    pub channel: Channel,

    /// The actual message content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is a contract with the client SDK: these tests
    //! pin the exact JSON shapes the serde attributes produce.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_player_id_bot_range() {
        assert!(!PlayerId(1).is_bot_id());
        assert!(PlayerId(PlayerId::BOT_BASE).is_bot_id());
        assert!(PlayerId(PlayerId::BOT_BASE + 5).is_bot_id());
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_game_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&GameKind::TicTacToe).unwrap(),
            "\"tic_tac_toe\""
        );
        assert_eq!(
            serde_json::to_string(&GameKind::Ludo).unwrap(),
            "\"ludo\""
        );
    }

    #[test]
    fn test_bot_profile_is_flagged() {
        let p = PlayerProfile::bot(PlayerId(PlayerId::BOT_BASE), "Botty");
        assert!(p.is_bot);
        assert_eq!(p.display_name, "Botty");
        assert!(p.college_id.is_empty());
    }

    // =====================================================================
    // Channel
    // =====================================================================

    #[test]
    fn test_channel_default_is_reliable_ordered() {
        assert_eq!(Channel::default(), Channel::ReliableOrdered);
    }

    #[test]
    fn test_channel_serializes_as_pascal_case() {
        let json = serde_json::to_string(&Channel::ReliableOrdered).unwrap();
        assert_eq!(json, "\"ReliableOrdered\"");
    }

    // =====================================================================
    // SystemMessage JSON shapes
    // =====================================================================

    #[test]
    fn test_handshake_json_format() {
        let msg = SystemMessage::Handshake {
            version: 1,
            credential: Some("abc".into()),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Handshake");
        assert_eq!(json["version"], 1);
        assert_eq!(json["credential"], "abc");
    }

    #[test]
    fn test_queue_update_json_format() {
        let msg = SystemMessage::QueueUpdate {
            players: vec![PlayerProfile {
                id: PlayerId(1),
                display_name: "Asha".into(),
                college_id: "c-9".into(),
                is_bot: false,
            }],
            count: 1,
            needed: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "QueueUpdate");
        assert_eq!(json["count"], 1);
        assert_eq!(json["needed"], 3);
        assert_eq!(json["players"][0]["display_name"], "Asha");
    }

    #[test]
    fn test_join_queue_round_trip() {
        let msg = SystemMessage::JoinQueue;
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: SystemMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_create_solo_round_trip() {
        let msg = SystemMessage::CreateSolo {
            difficulty: Difficulty::Hard,
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: SystemMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_room_joined_round_trip() {
        let msg = SystemMessage::RoomJoined {
            room_id: RoomId(5),
            game: GameKind::Ludo,
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: SystemMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_player_left_json_format() {
        let msg = SystemMessage::PlayerLeft {
            room_id: RoomId(2),
            player_id: PlayerId(9),
            reason: "opponent_left".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "PlayerLeft");
        assert_eq!(json["reason"], "opponent_left");
    }

    #[test]
    fn test_error_json_format() {
        let msg = SystemMessage::Error {
            code: 401,
            message: "Unauthorized".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 401);
        assert_eq!(json["message"], "Unauthorized");
    }

    #[test]
    fn test_room_list_round_trip() {
        let msg = SystemMessage::RoomList {
            rooms: vec![RoomListEntry {
                room_id: RoomId(1),
                game: GameKind::TicTacToe,
                player_count: 1,
                max_players: 2,
            }],
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: SystemMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    // =====================================================================
    // Payload / Envelope
    // =====================================================================

    #[test]
    fn test_payload_system_json_format() {
        let payload = Payload::System(SystemMessage::LeaveRoom);
        let json: serde_json::Value =
            serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "System");
        assert!(json["data"].is_object());
    }

    #[test]
    fn test_payload_game_json_format() {
        let payload = Payload::Game(vec![1, 2, 3]);
        let json: serde_json::Value =
            serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "Game");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope {
            seq: 42,
            timestamp: 15000,
            channel: Channel::ReliableOrdered,
            payload: Payload::Game(vec![1, 2, 3]),
        };
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope, decoded);
    }

    #[test]
    fn test_envelope_channel_defaults_when_missing() {
        let json = r#"{
            "seq": 1,
            "timestamp": 100,
            "payload": { "type": "Game", "data": [1] }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.channel, Channel::ReliableOrdered);
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<Envelope, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_system_message_type_returns_error() {
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        let result: Result<SystemMessage, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }
}
