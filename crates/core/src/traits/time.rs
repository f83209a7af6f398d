//! Time abstraction for timing-dependent logic.
//!
//! Debounced saving only needs a millisecond clock. Firmware reads
//! `embassy_time::Instant` through `EmbassyClock`; host tests use [`MockTime`].

use core::cell::Cell;

/// Millisecond clock
///
/// # Example
///
/// ```
/// use mpc_params_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// time.advance_ms(250);
/// assert_eq!(time.elapsed_since_ms(100), 150);
/// ```
pub trait TimeSource {
    /// Milliseconds since system start
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`, saturating at zero
    fn elapsed_since_ms(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

/// Manually advanced clock for tests
#[derive(Debug, Clone, Default)]
pub struct MockTime {
    current_ms: Cell<u64>,
}

impl MockTime {
    /// Clock starting at 0
    pub fn new() -> Self {
        Self {
            current_ms: Cell::new(0),
        }
    }

    /// Set the absolute time
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    /// Advance the clock
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get() + ms);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_time_advance() {
        let time = MockTime::new();
        assert_eq!(time.now_ms(), 0);

        time.advance_ms(500);
        time.advance_ms(500);
        assert_eq!(time.now_ms(), 1000);
    }

    #[test]
    fn test_elapsed_since_saturates() {
        let time = MockTime::new();
        time.set_ms(1_000);
        assert_eq!(time.elapsed_since_ms(300), 700);
        assert_eq!(time.elapsed_since_ms(5_000), 0);
    }
}
