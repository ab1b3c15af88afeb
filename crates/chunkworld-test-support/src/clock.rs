//! Test clock — a frozen `Clock` for asserting `last_used` stamps.

use chrono::{DateTime, TimeZone, Utc};
use chunkworld_core::clock::Clock;

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freezes the clock at `seconds` past the Unix epoch.
    ///
    /// # Panics
    ///
    /// Panics if `seconds` is outside chrono's representable range.
    #[must_use]
    pub fn at_unix(seconds: i64) -> Self {
        Self(
            Utc.timestamp_opt(seconds, 0)
                .single()
                .expect("timestamp in range"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
