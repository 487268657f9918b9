//! Time abstraction so the reclaimer and hold-expiry logic are testable without real sleeps.

use chrono::{DateTime, Utc};

/// Abstracts time operations for testability.
///
/// Production code uses [`SystemClock`]; tests substitute a fixed or
/// controllable clock so expiry logic can be exercised deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
