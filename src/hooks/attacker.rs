//! Attacker inference.
//!
//! The host's damage pipeline does not carry the attacker through to the
//! defender-side hooks, so the hit-application step records (defender,
//! attacker) pairs in a short-lived cache and the post-damage hook looks
//! the attacker back up. Entries older than the window are discarded
//! unmatched rather than attributing damage to a stale, unrelated attack.
//! Newest-first matching keeps rapid multi-attacker sequences attributed
//! correctly.

use std::time::{Duration, Instant};

use crate::core::ActorId;

#[derive(Clone, Copy, Debug)]
struct Entry {
    defender: ActorId,
    attacker: ActorId,
    at: Instant,
}

/// Short-lived (defender, attacker) association cache.
#[derive(Debug)]
pub struct AttackerCache {
    window: Duration,
    entries: Vec<Entry>,
}

impl AttackerCache {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Vec::new(),
        }
    }

    /// Record that `attacker` just landed a hit on `defender`.
    pub fn note(&mut self, defender: ActorId, attacker: ActorId, now: Instant) {
        self.prune(now);
        self.entries.push(Entry {
            defender,
            attacker,
            at: now,
        });
    }

    /// Consume the newest fresh entry for a defender, if any.
    pub fn take(&mut self, defender: ActorId, now: Instant) -> Option<ActorId> {
        self.prune(now);
        let idx = self
            .entries
            .iter()
            .rposition(|e| e.defender == defender)?;
        Some(self.entries.remove(idx).attacker)
    }

    fn prune(&mut self, now: Instant) {
        let window = self.window;
        self.entries
            .retain(|e| now.duration_since(e.at) <= window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_wins_and_stale_entries_expire() {
        let mut cache = AttackerCache::new(Duration::from_secs(10));
        let start = Instant::now();
        let defender = ActorId::new(1);
        cache.note(defender, ActorId::new(2), start);
        cache.note(defender, ActorId::new(3), start + Duration::from_secs(1));

        assert_eq!(
            cache.take(defender, start + Duration::from_secs(2)),
            Some(ActorId::new(3))
        );
        assert_eq!(
            cache.take(defender, start + Duration::from_secs(2)),
            Some(ActorId::new(2))
        );
        assert_eq!(cache.take(defender, start + Duration::from_secs(2)), None);

        cache.note(defender, ActorId::new(2), start);
        assert_eq!(cache.take(defender, start + Duration::from_secs(11)), None);
    }
}
