//! Configuration for the rating gate.
//!
//! Thresholds, prompt behavior and prompt copy. The configuration is fixed
//! once the gate is built.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder replaced by the application name in prompt copy.
pub const APP_NAME_PLACEHOLDER: &str = "{app}";

/// Placeholder replaced by the application identifier in the review URL.
pub const APP_ID_PLACEHOLDER: &str = "{app_id}";

/// Thresholds and prompt behavior.
///
/// # Examples
///
/// ```
/// use rategate::RatingConfig;
///
/// let config = RatingConfig::default();
/// assert_eq!(config.days_until_prompt, 3);
/// assert_eq!(config.uses_until_prompt, 3);
/// assert_eq!(config.days_before_reminding, 7);
///
/// let config = RatingConfig::default()
///     .with_days_until_prompt(0)
///     .with_uses_until_prompt(2);
/// assert!(config.offers_remind_later());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Days the tracked version must be installed before prompting
    pub days_until_prompt: u32,
    /// Uses that must be exceeded before prompting
    pub uses_until_prompt: u64,
    /// Days to wait after "remind me later"; 0 removes the remind button
    pub days_before_reminding: u32,
    /// Significant events required before prompting; 0 disables the check
    pub significant_events_until_prompt: u64,
    /// Reset counters whenever a new version is detected
    pub tracks_new_versions: bool,
    /// Keep prompting on new versions after the user rated once
    pub should_prompt_if_rated: bool,
    /// Skip every condition check
    pub bypass_conditions: bool,
    /// Delay between the eligibility decision and showing the prompt
    pub seconds_before_prompt_is_shown: u64,
    /// Ask the host for the platform review flow instead of the choice prompt
    pub use_native_review_flow: bool,
    /// Log every eligibility and tracking decision
    pub debug_enabled: bool,
    /// Overrides the name reported by the metadata provider
    pub app_name: Option<String>,
    /// Store listing URL; `{app_id}` is replaced by the application identifier
    pub review_url_template: String,
    /// Appended as `at=` when set
    pub affiliate_code: Option<String>,
    /// Appended as `ct=` when set
    pub affiliate_campaign: Option<String>,
    /// Prompt copy
    pub text: PromptText,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            days_until_prompt: 3,
            uses_until_prompt: 3,
            days_before_reminding: 7,
            significant_events_until_prompt: 0,
            tracks_new_versions: true,
            should_prompt_if_rated: true,
            bypass_conditions: false,
            seconds_before_prompt_is_shown: 0,
            use_native_review_flow: false,
            debug_enabled: false,
            app_name: None,
            review_url_template: "https://itunes.apple.com/app/id{app_id}?action=write-review".to_string(),
            affiliate_code: None,
            affiliate_campaign: None,
            text: PromptText::default(),
        }
    }
}

impl RatingConfig {
    /// Set the install age required before prompting.
    pub fn with_days_until_prompt(mut self, days: u32) -> Self {
        self.days_until_prompt = days;
        self
    }

    /// Set the use count that must be exceeded.
    pub fn with_uses_until_prompt(mut self, uses: u64) -> Self {
        self.uses_until_prompt = uses;
        self
    }

    /// Set the remind-later interval; 0 removes the button.
    pub fn with_days_before_reminding(mut self, days: u32) -> Self {
        self.days_before_reminding = days;
        self
    }

    /// Set the significant events required.
    pub fn with_significant_events_until_prompt(mut self, events: u64) -> Self {
        self.significant_events_until_prompt = events;
        self
    }

    /// Enable or disable version rollover.
    pub fn with_tracks_new_versions(mut self, enabled: bool) -> Self {
        self.tracks_new_versions = enabled;
        self
    }

    /// Keep prompting on new versions after a rating.
    pub fn with_should_prompt_if_rated(mut self, enabled: bool) -> Self {
        self.should_prompt_if_rated = enabled;
        self
    }

    /// Skip every eligibility check.
    pub fn with_bypass_conditions(mut self, enabled: bool) -> Self {
        self.bypass_conditions = enabled;
        self
    }

    /// Set the delay before the prompt appears.
    pub fn with_seconds_before_prompt_is_shown(mut self, seconds: u64) -> Self {
        self.seconds_before_prompt_is_shown = seconds;
        self
    }

    /// Use the platform review flow.
    pub fn with_native_review_flow(mut self, enabled: bool) -> Self {
        self.use_native_review_flow = enabled;
        self
    }

    /// Log eligibility and tracking decisions.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Override the application name shown in prompts.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the affiliate code and campaign.
    pub fn with_affiliate(mut self, code: impl Into<String>, campaign: impl Into<String>) -> Self {
        self.affiliate_code = Some(code.into());
        self.affiliate_campaign = Some(campaign.into());
        self
    }

    /// Delay before the prompt appears.
    pub fn prompt_delay(&self) -> Duration {
        Duration::from_secs(self.seconds_before_prompt_is_shown)
    }

    /// Whether the prompt carries a "remind me later" button.
    pub fn offers_remind_later(&self) -> bool {
        self.days_before_reminding > 0
    }

    /// Review URL for an application identifier.
    pub fn review_url(&self, app_id: &str) -> String {
        let mut url = self.review_url_template.replace(APP_ID_PLACEHOLDER, app_id);

        let params: Vec<String> = [("at", &self.affiliate_code), ("ct", &self.affiliate_campaign)]
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().filter(|v| !v.is_empty()).map(|v| format!("{}={}", name, v)))
            .collect();

        if !params.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&params.join("&"));
        }
        url
    }
}

/// Prompt copy. `{app}` is replaced by the application name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptText {
    pub title: String,
    pub message: String,
    pub cancel_button: String,
    pub rate_button: String,
    pub remind_button: String,
}

impl Default for PromptText {
    fn default() -> Self {
        Self {
            title: "Rate {app}".to_string(),
            message: "If you enjoy using {app}, would you mind taking a moment to rate it? \
                      It won't take more than a minute. Thanks for your support!"
                .to_string(),
            cancel_button: "No, Thanks".to_string(),
            rate_button: "Rate {app}".to_string(),
            remind_button: "Remind me later".to_string(),
        }
    }
}

impl PromptText {
    /// Substitute the application name into a template.
    pub fn render(template: &str, app_name: &str) -> String {
        template.replace(APP_NAME_PLACEHOLDER, app_name)
    }
}
