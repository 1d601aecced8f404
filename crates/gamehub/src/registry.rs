//! Connection registry: routes server-initiated messages to live
//! connections.
//!
//! Room broadcasts and queue updates originate outside any connection's
//! recv loop, so the orchestrator needs a way to reach a player's
//! socket by id. Each connection registers an unbounded channel here;
//! a per-connection pump task drains it into the socket.

use std::collections::HashMap;

use gamehub_protocol::{PlayerId, PlayerProfile, SystemMessage};
use tokio::sync::{mpsc, Mutex};

/// One outbound item, before envelope framing.
///
/// The pump task assigns the sequence number and timestamp when the
/// item actually leaves, so envelopes stay monotonic per connection no
/// matter which subsystem produced them.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// A framework-level message.
    System(SystemMessage),
    /// Pre-encoded game message bytes.
    Game(Vec<u8>),
}

/// Sender half of a connection's outbound channel.
pub(crate) type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Maps connected players to their outbound channels.
#[derive(Default)]
pub(crate) struct ConnectionRegistry {
    senders: Mutex<HashMap<PlayerId, OutboundSender>>,
}

impl ConnectionRegistry {
    /// Registers a player's outbound channel, replacing any previous
    /// one (a reconnecting player supersedes their dead channel).
    pub(crate) async fn register(
        &self,
        player_id: PlayerId,
        sender: OutboundSender,
    ) {
        self.senders.lock().await.insert(player_id, sender);
    }

    /// Removes a player's outbound channel.
    pub(crate) async fn unregister(&self, player_id: PlayerId) {
        self.senders.lock().await.remove(&player_id);
    }

    /// Returns a clone of a player's outbound sender, if connected.
    pub(crate) async fn sender_for(
        &self,
        player_id: PlayerId,
    ) -> Option<OutboundSender> {
        self.senders.lock().await.get(&player_id).cloned()
    }

    /// Sends a system message to one player. Silently dropped when the
    /// player has no live connection.
    pub(crate) async fn send_system(
        &self,
        player_id: PlayerId,
        msg: SystemMessage,
    ) {
        if let Some(sender) = self.senders.lock().await.get(&player_id) {
            let _ = sender.send(Outbound::System(msg));
        }
    }

    /// Sends a system message to every human in `players` that has a
    /// live connection. Bots are skipped — they have no socket.
    pub(crate) async fn broadcast_system(
        &self,
        players: &[PlayerProfile],
        msg: SystemMessage,
    ) {
        let senders = self.senders.lock().await;
        for profile in players {
            if profile.is_bot {
                continue;
            }
            if let Some(sender) = senders.get(&profile.id) {
                let _ = sender.send(Outbound::System(msg.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u64, name: &str) -> PlayerProfile {
        PlayerProfile {
            id: PlayerId(id),
            display_name: name.into(),
            college_id: "c-1".into(),
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn test_send_system_reaches_registered_player() {
        let registry = ConnectionRegistry::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(PlayerId(1), tx).await;

        registry
            .send_system(PlayerId(1), SystemMessage::LeaveQueue)
            .await;

        assert!(matches!(
            rx.recv().await,
            Some(Outbound::System(SystemMessage::LeaveQueue))
        ));
    }

    #[tokio::test]
    async fn test_send_to_unknown_player_is_silent() {
        let registry = ConnectionRegistry::default();
        registry
            .send_system(PlayerId(99), SystemMessage::LeaveQueue)
            .await;
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let registry = ConnectionRegistry::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(PlayerId(1), tx).await;
        registry.unregister(PlayerId(1)).await;

        registry
            .send_system(PlayerId(1), SystemMessage::LeaveQueue)
            .await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_bots_and_disconnected() {
        let registry = ConnectionRegistry::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        registry.register(PlayerId(1), tx1).await;

        let players = vec![
            profile(1, "asha"),
            profile(2, "vik"), // never registered
            PlayerProfile::bot(PlayerId(PlayerId::BOT_BASE), "Astra"),
        ];

        registry
            .broadcast_system(&players, SystemMessage::LeaveQueue)
            .await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx1.try_recv().is_err());
    }
}
