// SPDX-License-Identifier: MIT OR Apache-2.0
//! An injected clock, so TTL and lineage timestamps are deterministic in
//! tests instead of reading the system clock directly.

use chrono::{DateTime, Utc};

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`Clock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [`Clock`] that only advances when told to, for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Construct a clock starting at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::RwLock::new(start),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.now.write().expect("manual clock lock poisoned");
        *guard += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("manual clock lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_by_exact_duration() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::milliseconds(45_000));
        assert_eq!(clock.now(), start + chrono::Duration::milliseconds(45_000));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = clock.now();
        assert!(b >= a);
    }
}
