//! Eligibility evaluation.
//!
//! A pure predicate over configuration and a state snapshot. Checks run in a
//! fixed order and the first failing check decides the result.

use std::fmt;

use super::config::RatingConfig;
use crate::clock::{SECONDS_PER_DAY, days_to_seconds};
use crate::state::RatingState;

/// Why the prompt may not be shown right now.
#[derive(Debug, Clone, PartialEq)]
pub enum IneligibleReason {
    /// No application identifier configured
    MissingIdentifier,
    /// The tracked version has not been installed long enough
    TooSoon { elapsed_days: f64, required_days: u32 },
    /// The app has not been used enough times
    NotEnoughUses { uses: u64, required: u64 },
    /// Not enough significant events have been recorded
    NotEnoughEvents { events: u64, required: u64 },
    /// The user declined to rate this version
    Declined,
    /// The user already rated this version
    AlreadyRated,
    /// The user asked to be reminded later and the wait has not elapsed
    ReminderPending { elapsed_days: f64, required_days: u32 },
    /// The user rated an earlier version and re-prompting is disabled
    RatedPreviously,
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::MissingIdentifier => write!(f, "application identifier is empty"),
            IneligibleReason::TooSoon {
                elapsed_days,
                required_days,
            } => write!(
                f,
                "app has not been used long enough ({:.2} of {} days)",
                elapsed_days, required_days
            ),
            IneligibleReason::NotEnoughUses { uses, required } => {
                write!(f, "app has not been used enough times ({} uses, needs more than {})", uses, required)
            }
            IneligibleReason::NotEnoughEvents { events, required } => {
                write!(f, "not enough significant events ({} of {})", events, required)
            }
            IneligibleReason::Declined => write!(f, "user has declined to rate this version"),
            IneligibleReason::AlreadyRated => write!(f, "user has rated this version"),
            IneligibleReason::ReminderPending {
                elapsed_days,
                required_days,
            } => write!(
                f,
                "user wants to be reminded later ({:.2} of {} days elapsed)",
                elapsed_days, required_days
            ),
            IneligibleReason::RatedPreviously => write!(f, "user has already rated a previous version"),
        }
    }
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    /// All conditions hold
    Eligible,
    /// Conditions were skipped by configuration
    Bypassed,
    /// A condition failed
    Ineligible(IneligibleReason),
}

impl Eligibility {
    /// Whether the prompt may be shown.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, Eligibility::Ineligible(_))
    }

    /// The failing condition, if any.
    pub fn reason(&self) -> Option<&IneligibleReason> {
        match self {
            Eligibility::Ineligible(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Evaluate the conditions at `now` (epoch seconds).
pub fn evaluate(config: &RatingConfig, identifier: &str, state: &RatingState, now: f64) -> Eligibility {
    if config.bypass_conditions {
        return Eligibility::Bypassed;
    }

    if identifier.trim().is_empty() {
        return Eligibility::Ineligible(IneligibleReason::MissingIdentifier);
    }

    let since_first_use = now - state.first_use_date;
    if since_first_use < days_to_seconds(config.days_until_prompt) {
        return Eligibility::Ineligible(IneligibleReason::TooSoon {
            elapsed_days: since_first_use / SECONDS_PER_DAY,
            required_days: config.days_until_prompt,
        });
    }

    if state.use_count <= config.uses_until_prompt {
        return Eligibility::Ineligible(IneligibleReason::NotEnoughUses {
            uses: state.use_count,
            required: config.uses_until_prompt,
        });
    }

    if state.significant_event_count < config.significant_events_until_prompt {
        return Eligibility::Ineligible(IneligibleReason::NotEnoughEvents {
            events: state.significant_event_count,
            required: config.significant_events_until_prompt,
        });
    }

    if state.declined_current_version {
        return Eligibility::Ineligible(IneligibleReason::Declined);
    }

    if state.rated_current_version {
        return Eligibility::Ineligible(IneligibleReason::AlreadyRated);
    }

    let since_reminder = now - state.reminder_request_date;
    if since_reminder < days_to_seconds(config.days_before_reminding) {
        return Eligibility::Ineligible(IneligibleReason::ReminderPending {
            elapsed_days: since_reminder / SECONDS_PER_DAY,
            required_days: config.days_before_reminding,
        });
    }

    if !config.should_prompt_if_rated && state.rated_any_version {
        return Eligibility::Ineligible(IneligibleReason::RatedPreviously);
    }

    Eligibility::Eligible
}
