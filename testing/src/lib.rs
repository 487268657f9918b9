//! Test-only helpers shared across the ticketing crates.
//!
//! This crate provides a deterministic [`Clock`] implementation for tests
//! that need to control `expires_at`/`reserved_until` arithmetic without
//! sleeping or depending on wall-clock time.

use chrono::{DateTime, Utc};
use ticketing_core::Clock;

/// Mock implementations of engine traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Clock that always returns the same instant, for reproducible tests.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Creates a fixed clock pinned to `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC).
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which never happens
    /// in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_always_returns_the_same_instant() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }
}
