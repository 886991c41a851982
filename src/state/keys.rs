//! Logical key names and the per-application key space.

/// Logical names of the persisted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Version the counters currently belong to
    CurrentVersion,
    /// Version tracked before the last rollover
    PreviousVersion,
    /// Epoch seconds of the first use of the tracked version
    FirstUseDate,
    /// Launch/foreground count for the tracked version
    UseCount,
    /// Significant event count for the tracked version
    SignificantEventCount,
    /// Epoch seconds of the last "remind me later", 0 when unset
    ReminderRequestDate,
    /// User rated the tracked version
    RatedCurrentVersion,
    /// User rated the previously tracked version
    RatedPreviousVersion,
    /// User rated any version at some point
    RatedAnyVersion,
    /// User declined to rate the tracked version
    DeclinedToRate,
    /// User declined to rate the previously tracked version
    PreviousDeclinedToRate,
}

impl StateKey {
    /// Every key, in storage order.
    pub const ALL: [StateKey; 11] = [
        StateKey::CurrentVersion,
        StateKey::PreviousVersion,
        StateKey::FirstUseDate,
        StateKey::UseCount,
        StateKey::SignificantEventCount,
        StateKey::ReminderRequestDate,
        StateKey::RatedCurrentVersion,
        StateKey::RatedPreviousVersion,
        StateKey::RatedAnyVersion,
        StateKey::DeclinedToRate,
        StateKey::PreviousDeclinedToRate,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::CurrentVersion => "AppRatingCurrentVersion",
            StateKey::PreviousVersion => "AppRatingPreviousVersion",
            StateKey::FirstUseDate => "AppRatingFirstUseDate",
            StateKey::UseCount => "AppRatingUseCount",
            StateKey::SignificantEventCount => "AppRatingSignificantEventCount",
            StateKey::ReminderRequestDate => "AppRatingReminderRequestDate",
            StateKey::RatedCurrentVersion => "AppRatingRatedCurrentVersion",
            StateKey::RatedPreviousVersion => "AppRatingRatedPreviousVersion",
            StateKey::RatedAnyVersion => "AppRatingRatedAnyVersion",
            StateKey::DeclinedToRate => "AppRatingKeyDeclinedToRate",
            StateKey::PreviousDeclinedToRate => "AppRatingPreviousKeyDeclinedToRate",
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds storage keys of the form `{identifier}_{logical key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// Create a key space for an application identifier.
    pub fn new(identifier: &str) -> Self {
        Self {
            prefix: format!("{}_", identifier.trim()),
        }
    }

    /// The full storage key for a logical key.
    pub fn key(&self, key: StateKey) -> String {
        format!("{}{}", self.prefix, key.as_str())
    }

    /// The prefix shared by every key in this space.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
