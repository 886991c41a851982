//! Rating flow integration tests
//!
//! Drives the public gate API end to end with a scripted host, a manual
//! clock and real stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rategate::{
    ChannelLifecycleSource, Clock, IneligibleReason, KeyValueStore, LifecycleEvent, ManualClock, MemoryStore,
    PromptChoice, PromptOutcome, PromptPhase, RatingConfig, RatingGate, RatingListener, Result, ScriptedHost,
    SqliteStore, StaticMetadata,
};
use tempfile::TempDir;

/// Counts every listener notification.
#[derive(Default)]
struct RecordingListener {
    displayed: AtomicUsize,
    rated: AtomicUsize,
    declined: AtomicUsize,
    reminded: AtomicUsize,
    dismissed: AtomicUsize,
    native: AtomicUsize,
}

impl RatingListener for RecordingListener {
    fn on_prompt_displayed(&self) {
        self.displayed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rate(&self) {
        self.rated.fetch_add(1, Ordering::SeqCst);
    }

    fn on_decline(&self) {
        self.declined.fetch_add(1, Ordering::SeqCst);
    }

    fn on_remind_later(&self) {
        self.reminded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_dismissed(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_native_review_requested(&self) {
        self.native.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<ManualClock>,
    host: Arc<ScriptedHost>,
    listener: Arc<RecordingListener>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(ManualClock::starting_now()),
            host: Arc::new(ScriptedHost::new()),
            listener: Arc::new(RecordingListener::default()),
        }
    }

    /// Build a gate for `version` over the shared store, clock and host.
    fn gate(&self, version: &str, config: RatingConfig) -> RatingGate {
        RatingGate::builder(
            "284882215",
            Arc::clone(&self.store),
            Arc::new(StaticMetadata::new(version).with_display_name("Notes")),
            self.host.clone(),
        )
        .config(config)
        .clock(self.clock.clone())
        .listener(self.listener.clone())
        .build()
        .unwrap()
    }
}

fn quick_config() -> RatingConfig {
    RatingConfig::default()
        .with_days_until_prompt(0)
        .with_uses_until_prompt(2)
}

#[tokio::test]
async fn test_default_thresholds_then_rate() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Rate);
    let gate = harness.gate("1.0", RatingConfig::default());

    for _ in 0..3 {
        assert!(gate.record_use().is_none());
    }
    // Enough uses but the install is too young
    assert!(gate.record_use().is_none());
    assert!(matches!(
        gate.eligibility().reason(),
        Some(IneligibleReason::TooSoon { required_days: 3, .. })
    ));

    harness.clock.advance_days(3);
    let handle = gate.record_use().expect("prompt should be scheduled");
    assert_eq!(handle.outcome().await, PromptOutcome::RateChosen);

    let state = gate.state();
    assert!(state.rated_current_version);
    assert!(state.rated_any_version);
    assert_eq!(
        harness.host.opened_urls(),
        vec!["https://itunes.apple.com/app/id284882215?action=write-review".to_string()]
    );
    assert_eq!(harness.listener.displayed.load(Ordering::SeqCst), 1);
    assert_eq!(harness.listener.rated.load(Ordering::SeqCst), 1);

    assert!(gate.record_use().is_none());
    assert_eq!(gate.eligibility().reason(), Some(&IneligibleReason::AlreadyRated));
}

#[tokio::test]
async fn test_use_threshold_is_strict() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Dismissed);
    let gate = harness.gate("1.0", quick_config());

    assert!(gate.record_use().is_none());
    assert!(gate.record_use().is_none());
    assert!(!gate.is_eligible());

    let handle = gate.record_use().expect("third use should prompt");
    assert_eq!(handle.outcome().await, PromptOutcome::Dismissed);
    assert_eq!(harness.host.presented().len(), 1);
    assert_eq!(harness.listener.dismissed.load(Ordering::SeqCst), 1);

    // Dismissal leaves the record untouched
    let state = gate.state();
    assert!(!state.rated_current_version);
    assert!(!state.declined_current_version);
    assert_eq!(state.reminder_request_date, 0.0);
}

#[tokio::test]
async fn test_bypass_prompts_on_first_use() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Decline);
    let gate = harness.gate("1.0", RatingConfig::default().with_bypass_conditions(true));

    let handle = gate.record_use().expect("bypass should prompt immediately");
    assert_eq!(handle.outcome().await, PromptOutcome::Declined);
    assert!(gate.is_eligible());
}

#[tokio::test]
async fn test_decline_holds_until_new_version() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Decline);
    let gate = harness.gate("1.0", quick_config());

    gate.record_use();
    gate.record_use();
    let handle = gate.record_use().unwrap();
    assert_eq!(handle.outcome().await, PromptOutcome::Declined);
    assert_eq!(harness.listener.declined.load(Ordering::SeqCst), 1);

    harness.clock.advance_days(30);
    for _ in 0..5 {
        assert!(gate.record_use().is_none());
    }
    assert_eq!(gate.eligibility().reason(), Some(&IneligibleReason::Declined));

    // Upgrade: the same store seen by a gate on a newer version
    let upgraded = harness.gate("1.1", quick_config());
    assert!(upgraded.record_use().is_none());

    let state = upgraded.state();
    assert_eq!(state.current_version.as_deref(), Some("1.1"));
    assert_eq!(state.previous_version.as_deref(), Some("1.0"));
    assert_eq!(state.use_count, 1);
    assert_eq!(state.significant_event_count, 0);
    assert_eq!(state.first_use_date, harness.clock.epoch_seconds());
    assert!(!state.declined_current_version);
    assert!(state.declined_previous_version);

    // The next call on the same version is a plain increment
    assert!(upgraded.record_use().is_none());
    assert_eq!(upgraded.state().use_count, 2);
    assert_eq!(upgraded.state().previous_version.as_deref(), Some("1.0"));

    harness.host.push_choice(PromptChoice::Rate);
    let handle = upgraded.record_use().expect("new version should prompt again");
    assert_eq!(handle.outcome().await, PromptOutcome::RateChosen);
}

#[tokio::test]
async fn test_remind_later_waits_out_the_interval() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::RemindLater);
    let gate = harness.gate("1.0", quick_config());

    gate.record_use();
    gate.record_use();
    let handle = gate.record_use().unwrap();
    assert_eq!(handle.outcome().await, PromptOutcome::RemindLater);
    assert_eq!(gate.state().reminder_request_date, harness.clock.epoch_seconds());
    assert_eq!(harness.listener.reminded.load(Ordering::SeqCst), 1);

    harness.clock.advance_days(6);
    assert!(gate.record_use().is_none());
    assert!(matches!(
        gate.eligibility().reason(),
        Some(IneligibleReason::ReminderPending { required_days: 7, .. })
    ));

    harness.clock.advance_days(1);
    harness.host.push_choice(PromptChoice::Rate);
    let handle = gate.record_use().expect("reminder interval has elapsed");
    assert_eq!(handle.outcome().await, PromptOutcome::RateChosen);
}

#[tokio::test]
async fn test_no_remind_button_when_reminding_disabled() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Decline);
    let gate = harness.gate("1.0", quick_config().with_days_before_reminding(0));

    gate.record_use();
    gate.record_use();
    let handle = gate.record_use().unwrap();
    assert_eq!(handle.outcome().await, PromptOutcome::Declined);

    let presented = harness.host.presented();
    assert_eq!(presented.len(), 1);
    assert!(presented[0].buttons.remind_later.is_none());
    assert_eq!(presented[0].buttons.rate, "Rate Notes");
    assert!(gate.state().declined_current_version);
}

#[tokio::test]
async fn test_rated_previous_version_blocks_when_configured() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Rate);
    let config = quick_config().with_should_prompt_if_rated(false);
    let gate = harness.gate("1.0", config.clone());

    gate.record_use();
    gate.record_use();
    assert_eq!(gate.record_use().unwrap().outcome().await, PromptOutcome::RateChosen);

    let upgraded = harness.gate("2.0", config);
    for _ in 0..4 {
        assert!(upgraded.record_use().is_none());
    }
    let state = upgraded.state();
    assert!(state.rated_previous_version);
    assert!(!state.rated_current_version);
    assert_eq!(upgraded.eligibility().reason(), Some(&IneligibleReason::RatedPreviously));
}

#[tokio::test]
async fn test_pinned_when_version_tracking_disabled() {
    let harness = Harness::new();
    let config = quick_config().with_tracks_new_versions(false);
    let gate = harness.gate("1.0", config.clone());
    gate.record_use();

    let upgraded = harness.gate("2.0", config);
    upgraded.record_use();
    upgraded.record_use();

    let state = upgraded.state();
    assert_eq!(state.current_version.as_deref(), Some("1.0"));
    assert_eq!(state.use_count, 1);
    assert!(state.previous_version.is_none());
}

#[tokio::test]
async fn test_significant_events_respect_can_prompt() {
    let harness = Harness::new();
    let gate = harness.gate(
        "1.0",
        RatingConfig::default()
            .with_days_until_prompt(0)
            .with_uses_until_prompt(0)
            .with_significant_events_until_prompt(2),
    );

    assert!(gate.record_use().is_none());
    assert!(gate.record_significant_event(false).is_none());
    assert!(matches!(
        gate.eligibility().reason(),
        Some(IneligibleReason::NotEnoughEvents { events: 1, required: 2 })
    ));

    // Eligible now, but the caller opted out of prompting
    assert!(gate.record_significant_event(false).is_none());
    assert!(gate.is_eligible());
    assert!(harness.host.presented().is_empty());

    harness.host.push_choice(PromptChoice::Rate);
    let handle = gate.record_significant_event(true).expect("event may prompt");
    assert_eq!(handle.outcome().await, PromptOutcome::RateChosen);
    assert_eq!(gate.state().significant_event_count, 3);
}

#[tokio::test]
async fn test_use_prompts_after_silent_events() {
    let harness = Harness::new();
    let gate = harness.gate(
        "1.0",
        RatingConfig::default()
            .with_days_until_prompt(0)
            .with_uses_until_prompt(0)
            .with_significant_events_until_prompt(2),
    );

    assert!(gate.record_use().is_none());
    assert!(gate.record_significant_event(false).is_none());
    assert!(gate.record_significant_event(false).is_none());
    assert!(gate.is_eligible());
    assert!(harness.host.presented().is_empty());

    harness.host.push_choice(PromptChoice::Decline);
    let handle = gate.record_use().expect("a use may prompt once the events are in");
    assert_eq!(handle.outcome().await, PromptOutcome::Declined);
    assert_eq!(harness.host.presented().len(), 1);

    let state = gate.state();
    assert_eq!(state.use_count, 2);
    assert_eq!(state.significant_event_count, 2);
    assert!(state.declined_current_version);
}

#[tokio::test]
async fn test_rollover_on_significant_event_counts_it() {
    let harness = Harness::new();
    let gate = harness.gate("1.0", RatingConfig::default());
    gate.record_significant_event(false);
    gate.record_significant_event(false);
    gate.record_use();

    let upgraded = harness.gate("1.1", RatingConfig::default());
    upgraded.record_significant_event(false);

    let state = upgraded.state();
    assert_eq!(state.current_version.as_deref(), Some("1.1"));
    assert_eq!(state.significant_event_count, 1);
    assert_eq!(state.use_count, 1);
}

#[tokio::test]
async fn test_reset_all_counters_makes_gate_ineligible() {
    let harness = Harness::new();
    let gate = harness.gate("1.0", RatingConfig::default().with_uses_until_prompt(5));
    harness.clock.advance_days(10);
    gate.record_use();
    gate.rate();
    assert!(gate.state().rated_current_version);

    gate.reset_all_counters();
    assert!(!gate.is_eligible());

    let state = gate.state();
    assert_eq!(state.use_count, 1);
    assert!(!state.rated_current_version);
    assert!(state.rated_previous_version);
    assert!(state.rated_any_version);
}

#[tokio::test]
async fn test_second_trigger_while_outstanding_is_noop() {
    let harness = Harness::new();
    let gate = harness.gate("1.0", RatingConfig::default().with_bypass_conditions(true));

    let first = gate.record_use().expect("first trigger schedules");
    harness.host.wait_until_presented().await;
    assert_eq!(gate.prompt_phase(), PromptPhase::Visible);

    assert!(gate.record_use().is_none());
    assert!(gate.show_prompt().is_none());

    // Backgrounding dismisses the visible prompt without touching the record
    assert!(gate.app_will_resign_active());
    assert_eq!(first.outcome().await, PromptOutcome::Dismissed);
    assert_eq!(harness.host.dismissals(), 1);
    assert_eq!(harness.host.presented().len(), 1);
    assert_eq!(gate.prompt_phase(), PromptPhase::Idle);
    assert!(!gate.state().declined_current_version);
}

#[tokio::test(start_paused = true)]
async fn test_backgrounding_cancels_delayed_prompt() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Rate);
    let gate = harness.gate(
        "1.0",
        RatingConfig::default()
            .with_bypass_conditions(true)
            .with_seconds_before_prompt_is_shown(10),
    );

    let handle = gate.record_use().unwrap();
    assert_eq!(gate.prompt_phase(), PromptPhase::Scheduled);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(gate.handle_lifecycle(LifecycleEvent::WillResignActive).is_none());
    assert_eq!(handle.outcome().await, PromptOutcome::Cancelled);
    assert!(harness.host.presented().is_empty());
    assert_eq!(harness.listener.displayed.load(Ordering::SeqCst), 0);

    // Returning to the foreground schedules a fresh prompt
    let handle = gate.handle_lifecycle(LifecycleEvent::WillEnterForeground).unwrap();
    assert_eq!(handle.outcome().await, PromptOutcome::RateChosen);
}

#[tokio::test]
async fn test_native_review_flow() {
    let harness = Harness::new();
    let gate = harness.gate("1.0", quick_config().with_native_review_flow(true));

    gate.record_use();
    gate.record_use();
    let handle = gate.record_use().unwrap();
    assert_eq!(handle.outcome().await, PromptOutcome::NativeReviewRequested);
    assert_eq!(harness.host.native_requests(), 1);
    assert!(harness.host.presented().is_empty());
    assert_eq!(harness.listener.native.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_consumes_lifecycle_events() {
    let harness = Harness::new();
    harness.host.push_choice(PromptChoice::Rate);
    let gate = harness.gate("1.0", quick_config());

    let (tx, source) = ChannelLifecycleSource::channel(8);
    tx.send(LifecycleEvent::Launched).await.unwrap();
    tx.send(LifecycleEvent::WillResignActive).await.unwrap();
    tx.send(LifecycleEvent::WillEnterForeground).await.unwrap();
    tx.send(LifecycleEvent::WillEnterForeground).await.unwrap();
    drop(tx);

    assert_eq!(gate.run(source).await, 4);
    assert_eq!(gate.state().use_count, 3);

    harness.host.wait_until_presented().await;
    assert_eq!(harness.host.presented().len(), 1);
}

#[tokio::test]
async fn test_state_survives_reopening_sqlite_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("rategate.db");

    {
        let harness = Harness::with_store(Arc::new(SqliteStore::open_at(&path)?));
        let gate = harness.gate("1.0", RatingConfig::default());
        gate.record_use();
        gate.record_use();
        gate.record_significant_event(false);
    }

    let harness = Harness::with_store(Arc::new(SqliteStore::open_at(&path)?));
    let gate = harness.gate("1.0", RatingConfig::default());
    let state = gate.state();
    assert_eq!(state.current_version.as_deref(), Some("1.0"));
    assert_eq!(state.use_count, 2);
    assert_eq!(state.significant_event_count, 1);
    assert!(state.first_use_date > 0.0);

    Ok(())
}
