//! Wall-clock seam used to stamp when a chunk was last touched.

use chrono::{DateTime, Utc};

/// Source of the current time for chunk bookkeeping.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Whole seconds since the Unix epoch, the unit of `last_used`.
    fn unix_seconds(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Reads the host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Frozen(DateTime<Utc>);

    impl Clock for Frozen {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_unix_seconds_truncates_subsecond_precision() {
        let instant = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();

        assert_eq!(Frozen(instant).unix_seconds(), 1_700_000_000);
    }
}
