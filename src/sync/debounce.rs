//! Movement/targeting debounce.
//!
//! Token drags and target swaps arrive in rapid bursts. Rescanning range
//! conditions on every intermediate event would thrash the reconciler, so
//! bursts coalesce into one rescan after a quiet window. Time is passed in
//! explicitly so tests stay deterministic.

use std::time::{Duration, Instant};

/// Coalesces bursts of movement events into a single deferred rescan.
#[derive(Debug)]
pub struct MoveDebouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl MoveDebouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Note a movement event; pushes the pending rescan out by one window.
    pub fn note(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Whether a rescan is owed and its quiet window has elapsed. Consumes
    /// the pending state when it fires.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether a rescan is pending at all.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_coalesces_into_one_flush() {
        let mut debounce = MoveDebouncer::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.note(start);
        debounce.note(start + Duration::from_millis(100));
        debounce.note(start + Duration::from_millis(200));

        // Still inside the window of the last event.
        assert!(!debounce.flush_due(start + Duration::from_millis(400)));
        assert!(debounce.flush_due(start + Duration::from_millis(500)));
        // Consumed.
        assert!(!debounce.flush_due(start + Duration::from_millis(600)));
    }
}
