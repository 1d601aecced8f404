//! Wire protocol for Gamehub.
//!
//! Defines the language clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`PlayerProfile`], …) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (raw bytes) and the
//! orchestrator (player context). It knows nothing about connections,
//! queues, or rooms.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Channel, Difficulty, Envelope, GameKind, Payload, PlayerId,
    PlayerProfile, Recipient, RoomId, RoomListEntry, SystemMessage,
};
