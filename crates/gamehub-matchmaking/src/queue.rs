//! The matchmaking queue.
//!
//! A plain synchronous struct, like the session manager: the
//! orchestrator guards it with a mutex one level up. Keeping it
//! synchronous means a match forms inside the same call that filled the
//! queue — two near-simultaneous joins can't both observe "3 waiting"
//! and race past each other.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use gamehub_protocol::{PlayerId, PlayerProfile};

use crate::QueueError;

/// Counter for synthesized bot IDs, offset into the reserved bot range.
static NEXT_BOT_ID: AtomicU64 = AtomicU64::new(0);

/// Display names cycled through for filler bots.
const BOT_NAMES: [&str; 4] = ["Astra", "Blitz", "Comet", "Drift"];

/// Builds a fresh bot profile with a unique id in the reserved bot
/// range and a cycled display name.
///
/// Every synthesized bot — queue filler or solo-room opponent — comes
/// from here, so bot ids never collide across subsystems.
pub fn synthesize_bot() -> PlayerProfile {
    let n = NEXT_BOT_ID.fetch_add(1, Ordering::Relaxed);
    let name = BOT_NAMES[n as usize % BOT_NAMES.len()];
    PlayerProfile::bot(PlayerId(PlayerId::BOT_BASE + n), name.to_string())
}

/// How the queue behaves when it can't fill a match with humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillStrategy {
    /// Wait for enough humans. The production default.
    #[default]
    None,
    /// When exactly one human is queued, synthesize bots to capacity so
    /// a match starts immediately. Demo and single-player testing only.
    AutoBots,
}

/// Configuration for the matchmaking queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Players per match. The queue forms a match the moment this many
    /// are waiting.
    pub capacity: usize,

    /// Bot fill behavior.
    pub fill: FillStrategy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            fill: FillStrategy::None,
        }
    }
}

/// One waiting player.
#[derive(Debug, Clone)]
struct QueueEntry {
    profile: PlayerProfile,
    queued_at: Instant,
}

/// What happened as a result of a queue operation.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// The queue changed but no match formed yet. Broadcast to every
    /// queued connection.
    Updated {
        /// Everyone still waiting, in join order.
        players: Vec<PlayerProfile>,
        /// How many more players are needed to form a match.
        needed: usize,
    },

    /// A match formed. The players are removed from the queue and
    /// listed in join order — join order is turn order.
    Ready(Vec<PlayerProfile>),
}

/// FIFO waitlist for players wanting a match.
///
/// Whoever queued first is matched first; that ordering is a fairness
/// guarantee, not an implementation accident.
pub struct MatchQueue {
    entries: Vec<QueueEntry>,
    config: QueueConfig,
}

impl MatchQueue {
    /// Creates an empty queue with the given config.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            entries: Vec::new(),
            config,
        }
    }

    /// Adds a player to the back of the queue.
    ///
    /// Returns [`QueueEvent::Ready`] when this join filled the queue to
    /// capacity (possibly via bot fill), otherwise
    /// [`QueueEvent::Updated`].
    ///
    /// # Errors
    /// [`QueueError::AlreadyQueued`] if the player is already waiting.
    pub fn enqueue(
        &mut self,
        profile: PlayerProfile,
    ) -> Result<QueueEvent, QueueError> {
        let player_id = profile.id;
        if self.entries.iter().any(|e| e.profile.id == player_id) {
            return Err(QueueError::AlreadyQueued(player_id));
        }

        self.entries.push(QueueEntry {
            profile,
            queued_at: Instant::now(),
        });
        tracing::info!(%player_id, waiting = self.entries.len(), "player queued");

        if self.config.fill == FillStrategy::AutoBots
            && self.entries.len() == 1
            && !self.entries[0].profile.is_bot
        {
            self.fill_with_bots();
        }

        if self.entries.len() >= self.config.capacity {
            let waited_ms = self
                .longest_wait()
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            let players = self.dequeue_all(self.config.capacity);
            tracing::info!(
                players = players.len(),
                waited_ms,
                "match formed"
            );
            return Ok(QueueEvent::Ready(players));
        }

        Ok(self.updated())
    }

    /// Removes a player from the queue.
    ///
    /// If the leaving player was human and filler bots are waiting, the
    /// bots are evicted too — they exist only to accompany that human.
    ///
    /// # Errors
    /// [`QueueError::NotQueued`] if the player isn't waiting.
    pub fn leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<QueueEvent, QueueError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.profile.id == player_id)
            .ok_or(QueueError::NotQueued(player_id))?;
        let entry = self.entries.remove(pos);

        if !entry.profile.is_bot {
            self.entries.retain(|e| !e.profile.is_bot);
        }
        tracing::info!(%player_id, waiting = self.entries.len(), "player left queue");

        Ok(self.updated())
    }

    /// Atomically removes and returns the first `n` entries in join
    /// order (FIFO).
    pub fn dequeue_all(&mut self, n: usize) -> Vec<PlayerProfile> {
        let n = n.min(self.entries.len());
        self.entries
            .drain(..n)
            .map(|e| e.profile)
            .collect()
    }

    /// Everyone currently waiting, in join order.
    pub fn waiting(&self) -> Vec<PlayerProfile> {
        self.entries.iter().map(|e| e.profile.clone()).collect()
    }

    /// How long the player at the front has been waiting, if anyone is.
    pub fn longest_wait(&self) -> Option<std::time::Duration> {
        self.entries.first().map(|e| e.queued_at.elapsed())
    }

    /// Returns the number of waiting players.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn updated(&self) -> QueueEvent {
        QueueEvent::Updated {
            players: self.waiting(),
            needed: self.config.capacity.saturating_sub(self.entries.len()),
        }
    }

    /// Appends synthesized bots until the queue hits capacity.
    fn fill_with_bots(&mut self) {
        while self.entries.len() < self.config.capacity {
            let profile = synthesize_bot();
            tracing::debug!(bot_id = %profile.id, "filler bot queued");
            self.entries.push(QueueEntry {
                profile,
                queued_at: Instant::now(),
            });
        }
    }
}

impl Default for MatchQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
