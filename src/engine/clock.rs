//! Time source abstraction for deterministic accrual.
//!
//! Accrual, lock expiry and leaderboard tie-breaking all depend on "now".
//! Injecting the clock keeps that logic testable without wall-clock
//! flakiness.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time via chrono.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Manually advanced clock for tests and simulations.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at the given unix timestamp (seconds).
    pub fn new(start: u64) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute unix timestamp.
    pub fn set(&self, timestamp: u64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), 1_000);
        clock.advance(86_400);
        assert_eq!(clock.now(), 87_400);
        clock.set(500);
        assert_eq!(clock.now(), 500);
    }
}
