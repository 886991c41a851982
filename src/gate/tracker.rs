//! Usage tracking and version rollover.
//!
//! Callers serialize these functions; each one is a read-modify-write over
//! the persisted record.

use std::fmt;

use super::config::RatingConfig;
use crate::state::StateStore;

/// Which counter a tracked call increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// App launch or return to foreground
    Use,
    /// Application-defined significant event
    SignificantEvent,
}

impl Counter {
    /// Short name used in logs and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Use => "use",
            Counter::SignificantEvent => "significant event",
        }
    }
}

/// What a tracked call did to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackChange {
    /// The counter was incremented for the tracked version
    Incremented { counter: Counter, count: u64 },
    /// A new version was detected and the counters restarted
    RolledOver { from: String, to: String },
    /// A new version was detected but version tracking is disabled
    Pinned { tracked: String, running: String },
}

impl fmt::Display for TrackChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackChange::Incremented { counter, count } => write!(f, "incremented {} count to {}", counter.as_str(), count),
            TrackChange::RolledOver { from, to } => write!(f, "reset tracking version from {} to {}", from, to),
            TrackChange::Pinned { tracked, running } => {
                write!(f, "running {} but tracking is pinned to {}", running, tracked)
            }
        }
    }
}

/// Record one use or significant event for `running_version` at `now`.
pub fn track(
    state: &StateStore,
    config: &RatingConfig,
    running_version: &str,
    now: f64,
    counter: Counter,
) -> TrackChange {
    let tracked = match state.tracked_version() {
        Some(version) => version,
        None => {
            state.set_tracked_version(running_version);
            running_version.to_string()
        }
    };

    let change = if tracked == running_version {
        if state.first_use_date() == 0.0 {
            state.set_first_use_date(now);
        }
        let count = match counter {
            Counter::Use => {
                let count = state.use_count().saturating_add(1);
                state.set_use_count(count);
                count
            }
            Counter::SignificantEvent => {
                let count = state.significant_event_count().saturating_add(1);
                state.set_significant_event_count(count);
                count
            }
        };
        TrackChange::Incremented { counter, count }
    } else if config.tracks_new_versions {
        roll_over(state, running_version, now);
        if counter == Counter::SignificantEvent {
            state.set_significant_event_count(1);
        }
        TrackChange::RolledOver {
            from: tracked,
            to: running_version.to_string(),
        }
    } else {
        TrackChange::Pinned {
            tracked,
            running: running_version.to_string(),
        }
    };

    state.flush();
    change
}

/// Archive the tracked version's decisions and restart counting for
/// `version` as of `now`.
pub fn roll_over(state: &StateStore, version: &str, now: f64) {
    state.archive_and_adopt(version);
    state.set_significant_event_count(0);
    reset_usage(state, now);
}

/// Restart the install clock and use count.
pub fn reset_usage(state: &StateStore, now: f64) {
    state.set_first_use_date(now);
    state.set_use_count(1);
}
