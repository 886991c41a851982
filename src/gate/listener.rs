//! Notifications about prompt activity.

/// Observer of prompt activity. Every method defaults to a no-op.
pub trait RatingListener: Send + Sync {
    /// The choice prompt became visible.
    fn on_prompt_displayed(&self) {}

    /// The user chose to rate.
    fn on_rate(&self) {}

    /// The user declined to rate this version.
    fn on_decline(&self) {}

    /// The user asked to be reminded later.
    fn on_remind_later(&self) {}

    /// The prompt closed without a decision.
    fn on_dismissed(&self) {}

    /// The platform review flow was requested.
    fn on_native_review_requested(&self) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl RatingListener for NoopListener {}
