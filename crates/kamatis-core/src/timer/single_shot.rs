/// A single-shot timer armed against a [`Clock`](super::Clock) reading.
///
/// Holds at most one pending deadline. Starting an armed timer replaces the
/// previous deadline; stopping is idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleShot {
    interval_ms: u64,
    deadline_ms: Option<u64>,
}

impl SingleShot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    /// Arm (or re-arm) the timer to fire `interval_ms` after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.interval_ms));
    }

    pub fn stop(&mut self) {
        self.deadline_ms = None;
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Time left before firing, `None` when not armed.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| d <= now_ms)
    }

    /// Disarm if due, reporting whether the timer fired.
    pub fn take_if_due(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.deadline_ms = None;
            true
        } else {
            false
        }
    }
}
