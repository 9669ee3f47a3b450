// Small foundations: coalesced deferred execution and listener bookkeeping.

use std::time::{Duration, Instant};

/// Default delay for deferred work (mouse-release bursts, paste cleanup).
pub const DEFAULT_DELAY: Duration = Duration::from_millis(50);

/// Delay for keyboard-driven selection re-evaluation.
pub const KEY_DELAY: Duration = Duration::from_millis(200);

/// Coalesces rapid repeated triggers into a single evaluation after a quiet
/// period. Scheduling replaces any still-pending deadline (last scheduler
/// wins, not a queue).
#[derive(Debug, Default)]
pub struct Debouncer {
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an evaluation `delay` after `now`, cancelling any pending one.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once the pending deadline has passed; clears it.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Ordered listener registry keyed by (target, event kind), owned by one
/// editor instance. Every registered binding is recorded here so teardown can
/// remove exactly those and only those.
#[derive(Debug)]
pub struct ListenerRegistry<T, K, H> {
    entries: Vec<(T, K, H)>,
}

impl<T: PartialEq + Copy, K: PartialEq + Copy, H> ListenerRegistry<T, K, H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, target: T, kind: K, handler: H) {
        self.entries.push((target, kind, handler));
    }

    /// Handlers bound to (target, kind), in registration order.
    pub fn handlers(&self, target: T, kind: K) -> impl Iterator<Item = &H> {
        self.entries
            .iter()
            .filter(move |(t, k, _)| *t == target && *k == kind)
            .map(|(_, _, h)| h)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: PartialEq + Copy, K: PartialEq + Copy, H> Default for ListenerRegistry<T, K, H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_last_scheduler_wins() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        d.schedule(t0, Duration::from_millis(50));
        d.schedule(t0, Duration::from_millis(200));

        // The first deadline was replaced, so nothing fires at +60ms.
        assert!(!d.fire(t0 + Duration::from_millis(60)));
        assert!(d.is_pending());
        assert!(d.fire(t0 + Duration::from_millis(200)));
        assert!(!d.is_pending());
    }

    #[test]
    fn test_debounce_cancel() {
        let mut d = Debouncer::new();
        let t0 = Instant::now();
        d.schedule(t0, DEFAULT_DELAY);
        d.cancel();
        assert!(!d.fire(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_registry_order_and_teardown() {
        let mut reg: ListenerRegistry<u8, u8, &str> = ListenerRegistry::new();
        reg.add(0, 1, "first");
        reg.add(0, 1, "second");
        reg.add(1, 1, "other-target");

        let bound: Vec<_> = reg.handlers(0, 1).copied().collect();
        assert_eq!(bound, vec!["first", "second"]);

        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.handlers(0, 1).count(), 0);
    }
}
