//! Save debouncing
//!
//! Parameter changes tend to arrive in bursts (a ground station writing a
//! whole tuning page). [`SaveDebouncer`] folds a burst into one flash write:
//! each request restarts the quiet window, but a save is never postponed
//! more than `max_delay_ms` past the first request of the burst.
//!
//! The debouncer is a pure state machine over millisecond timestamps. The
//! firmware saver task drives it from a timer; tests drive it from
//! [`MockTime`](crate::traits::MockTime).

/// Default quiet window before saving
pub const DEFAULT_DEBOUNCE_MS: u64 = 5_000;

/// Default upper bound on how long a save can be postponed
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Debounce state for save requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveDebouncer {
    window_ms: u64,
    max_delay_ms: u64,
    /// Time of the first request in the pending burst
    first_request: Option<u64>,
    deadline: u64,
}

impl SaveDebouncer {
    /// Create a debouncer; `max_delay_ms` is raised to at least `window_ms`
    pub const fn new(window_ms: u64, max_delay_ms: u64) -> Self {
        let max_delay_ms = if max_delay_ms < window_ms {
            window_ms
        } else {
            max_delay_ms
        };
        Self {
            window_ms,
            max_delay_ms,
            first_request: None,
            deadline: 0,
        }
    }

    /// Schedule a save, restarting the quiet window
    pub fn request(&mut self, now_ms: u64) {
        let first = *self.first_request.get_or_insert(now_ms);
        let restarted = now_ms.saturating_add(self.window_ms);
        let cap = first.saturating_add(self.max_delay_ms);
        self.deadline = restarted.min(cap);
    }

    /// Schedule a save at `now_ms`, bypassing the window
    pub fn request_immediate(&mut self, now_ms: u64) {
        self.first_request.get_or_insert(now_ms);
        self.deadline = now_ms;
    }

    /// Returns true exactly once when a pending save is due
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.first_request.is_some() && now_ms >= self.deadline {
            self.first_request = None;
            return true;
        }
        false
    }

    /// Deadline of the pending save, if any
    pub fn deadline(&self) -> Option<u64> {
        self.first_request.map(|_| self.deadline)
    }

    /// True while a save is scheduled
    pub fn is_pending(&self) -> bool {
        self.first_request.is_some()
    }

    /// Drop the pending save
    pub fn cancel(&mut self) {
        self.first_request = None;
    }
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_DELAY_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockTime, TimeSource};

    #[test]
    fn test_single_request_fires_after_window() {
        let time = MockTime::new();
        let mut debouncer = SaveDebouncer::new(100, 1_000);

        assert!(!debouncer.poll(time.now_ms()));
        debouncer.request(time.now_ms());
        assert_eq!(debouncer.deadline(), Some(100));

        time.advance_ms(99);
        assert!(!debouncer.poll(time.now_ms()));
        time.advance_ms(1);
        assert!(debouncer.poll(time.now_ms()));

        // Fires once
        assert!(!debouncer.poll(time.now_ms()));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_restarts_window() {
        let time = MockTime::new();
        let mut debouncer = SaveDebouncer::new(100, 1_000);

        for _ in 0..5 {
            debouncer.request(time.now_ms());
            time.advance_ms(50);
            assert!(!debouncer.poll(time.now_ms()));
        }
        // Last request at 200, window ends at 300
        assert_eq!(debouncer.deadline(), Some(300));
        time.set_ms(300);
        assert!(debouncer.poll(time.now_ms()));
    }

    #[test]
    fn test_max_delay_caps_continuous_requests() {
        let time = MockTime::new();
        let mut debouncer = SaveDebouncer::new(100, 250);

        let mut fired_at = None;
        for _ in 0..20 {
            debouncer.request(time.now_ms());
            time.advance_ms(50);
            if debouncer.poll(time.now_ms()) {
                fired_at = Some(time.now_ms());
                break;
            }
        }
        assert_eq!(fired_at, Some(250));
    }

    #[test]
    fn test_immediate_bypasses_window() {
        let time = MockTime::new();
        let mut debouncer = SaveDebouncer::default();

        debouncer.request(time.now_ms());
        time.advance_ms(10);
        debouncer.request_immediate(time.now_ms());
        assert!(debouncer.poll(time.now_ms()));
    }

    #[test]
    fn test_max_delay_not_below_window() {
        let mut debouncer = SaveDebouncer::new(500, 100);
        debouncer.request(0);
        assert_eq!(debouncer.deadline(), Some(500));

        debouncer.cancel();
        assert_eq!(debouncer.deadline(), None);
    }
}
