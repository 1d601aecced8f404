//! FIFO matchmaking for Gamehub.
//!
//! Players wanting a multiplayer match wait in a [`MatchQueue`]; the
//! queue forms a match synchronously the moment it hits capacity, in
//! join order. An injectable [`FillStrategy`] decides whether a lone
//! human gets bot opponents or waits for real ones.

mod error;
mod queue;

pub use error::QueueError;
pub use queue::{
    synthesize_bot, FillStrategy, MatchQueue, QueueConfig, QueueEvent,
};
