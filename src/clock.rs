//! Wall-clock access for rategate
//!
//! Timestamps are persisted as epoch seconds (doubles). The gate reads time
//! through the `Clock` trait so hosts and tests can drive it deterministically.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Mutex;

/// Seconds in one day; day thresholds are converted with this factor.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as epoch seconds.
    fn epoch_seconds(&self) -> f64 {
        to_epoch_seconds(self.now())
    }
}

/// Convert a timestamp to fractional epoch seconds.
pub fn to_epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Convert a day count to seconds.
pub fn days_to_seconds(days: u32) -> f64 {
    f64::from(days) * SECONDS_PER_DAY
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at the given time.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the current system time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += delta;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.advance(TimeDelta::days(days));
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
