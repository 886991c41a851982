//! The rating gate.
//!
//! `RatingGate` ties the pieces together: it tracks uses and significant
//! events in the persisted record, evaluates eligibility after each update,
//! and hands eligible prompts to the dispatcher.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rategate::{RatingConfig, RatingGate, ScriptedHost, SqliteStore, StaticMetadata};
//!
//! #[tokio::main]
//! async fn main() -> rategate::Result<()> {
//!     let store = Arc::new(SqliteStore::open_at(std::path::Path::new("rategate.db"))?);
//!     let gate = RatingGate::builder(
//!         "284882215",
//!         store,
//!         Arc::new(StaticMetadata::new("1.0.0")),
//!         Arc::new(ScriptedHost::new()),
//!     )
//!     .config(RatingConfig::default().with_uses_until_prompt(5))
//!     .build()?;
//!
//!     if let Some(prompt) = gate.record_use() {
//!         println!("prompt ended: {}", prompt.outcome().await);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod dispatcher;
mod eligibility;
mod listener;
mod tracker;

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;

pub use config::{PromptText, RatingConfig};
pub use dispatcher::{PromptDispatcher, PromptHandle, PromptOutcome, PromptPhase, PromptRequest};
pub use eligibility::{Eligibility, IneligibleReason, evaluate};
pub use listener::{NoopListener, RatingListener};
pub use tracker::{Counter, TrackChange};

use crate::clock::{Clock, SystemClock};
use crate::error::{RateGateError, Result};
use crate::host::{ChoicePrompt, PromptButtons, PromptChoice, UiHost};
use crate::lifecycle::{LifecycleEvent, LifecycleSource};
use crate::metadata::{AppMetadata, DEFAULT_APP_NAME};
use crate::state::{RatingState, StateStore};
use crate::storage::KeyValueStore;

/// Builds a `RatingGate`. The identifier and collaborators are required up
/// front; everything else has defaults.
pub struct RatingGateBuilder {
    identifier: String,
    store: Arc<dyn KeyValueStore>,
    metadata: Arc<dyn AppMetadata>,
    host: Arc<dyn UiHost>,
    config: RatingConfig,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn RatingListener>,
    runtime: Option<Handle>,
}

impl RatingGateBuilder {
    /// Start a builder with default config, system clock and no-op listener.
    pub fn new(
        identifier: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        metadata: Arc<dyn AppMetadata>,
        host: Arc<dyn UiHost>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            store,
            metadata,
            host,
            config: RatingConfig::default(),
            clock: Arc::new(SystemClock),
            listener: Arc::new(NoopListener),
            runtime: None,
        }
    }

    /// Thresholds and prompt behavior.
    pub fn config(mut self, config: RatingConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source, the system clock by default.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Observer of prompt activity.
    pub fn listener(mut self, listener: Arc<dyn RatingListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Runtime that runs prompt tasks. Defaults to the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the gate.
    ///
    /// Fails when the identifier is empty, when the metadata reports no
    /// version, or when no runtime was given and none is current.
    pub fn build(self) -> Result<RatingGate> {
        let identifier = self.identifier.trim().to_string();
        if identifier.is_empty() {
            return Err(RateGateError::MissingIdentifier);
        }

        let version = self.metadata.current_version().ok_or(RateGateError::MissingVersion)?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| RateGateError::NoRuntime(e.to_string()))?,
        };

        let app_name = self
            .config
            .app_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.metadata.display_name())
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        log::info!("Rating gate ready for {} ({} {})", identifier, app_name, version);

        let dispatcher = PromptDispatcher::new(runtime, Arc::clone(&self.host), Arc::clone(&self.listener));
        Ok(RatingGate {
            inner: Arc::new(GateInner {
                state: StateStore::new(self.store, &identifier),
                identifier,
                app_name,
                config: self.config,
                metadata: self.metadata,
                host: self.host,
                clock: self.clock,
                tracker_lock: Mutex::new(()),
                dispatcher,
            }),
        })
    }
}

struct GateInner {
    identifier: String,
    app_name: String,
    config: RatingConfig,
    state: StateStore,
    metadata: Arc<dyn AppMetadata>,
    host: Arc<dyn UiHost>,
    clock: Arc<dyn Clock>,
    tracker_lock: Mutex<()>,
    dispatcher: PromptDispatcher,
}

impl GateInner {
    fn debug_log(&self, message: impl Display) {
        if self.config.debug_enabled {
            log::debug!("[{}] {}", self.identifier, message);
        }
    }

    fn now(&self) -> f64 {
        self.clock.epoch_seconds()
    }

    fn eligibility(&self) -> Eligibility {
        let state = self.state.snapshot();
        let result = evaluate(&self.config, &self.identifier, &state, self.now());
        match &result {
            Eligibility::Eligible => self.debug_log("rating conditions met"),
            Eligibility::Bypassed => self.debug_log("rating conditions bypassed"),
            Eligibility::Ineligible(reason) => self.debug_log(format!("rating conditions not met: {}", reason)),
        }
        result
    }

    fn review_url(&self) -> String {
        let url = self.config.review_url(&self.identifier);
        self.debug_log(format!("review url: {}", url));
        url
    }

    /// Serializes every read-modify-write of the record.
    fn lock_tracker(&self) -> MutexGuard<'_, ()> {
        self.tracker_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rate(&self) {
        {
            let _guard = self.lock_tracker();
            self.state.mark_rated();
            self.state.flush();
        }
        self.host.open_review_url(&self.review_url());
    }

    fn apply_choice(&self, choice: PromptChoice) -> PromptOutcome {
        self.debug_log(format!("user chose {:?}", choice));
        match choice {
            PromptChoice::Rate => {
                self.rate();
                PromptOutcome::RateChosen
            }
            PromptChoice::Decline => {
                let _guard = self.lock_tracker();
                self.state.mark_declined();
                self.state.flush();
                PromptOutcome::Declined
            }
            PromptChoice::RemindLater if self.config.offers_remind_later() => {
                let _guard = self.lock_tracker();
                self.state.set_reminder_request_date(self.now());
                self.state.flush();
                PromptOutcome::RemindLater
            }
            PromptChoice::RemindLater => {
                log::warn!("Host answered remind-later but reminders are disabled; treating as dismissal");
                PromptOutcome::Dismissed
            }
            PromptChoice::Dismissed => PromptOutcome::Dismissed,
        }
    }

    fn choice_prompt(&self) -> ChoicePrompt {
        let text = &self.config.text;
        let render = |template: &str| PromptText::render(template, &self.app_name);
        ChoicePrompt {
            title: render(&text.title),
            message: render(&text.message),
            buttons: PromptButtons {
                cancel: render(&text.cancel_button),
                rate: render(&text.rate_button),
                remind_later: self
                    .config
                    .offers_remind_later()
                    .then(|| render(&text.remind_button)),
            },
        }
    }
}

/// Decides when to ask the user for a rating.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RatingGate {
    inner: Arc<GateInner>,
}

impl std::fmt::Debug for RatingGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingGate")
            .field("identifier", &self.inner.identifier)
            .field("app_name", &self.inner.app_name)
            .finish_non_exhaustive()
    }
}

impl RatingGate {
    /// Start building a gate for an application identifier.
    pub fn builder(
        identifier: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        metadata: Arc<dyn AppMetadata>,
        host: Arc<dyn UiHost>,
    ) -> RatingGateBuilder {
        RatingGateBuilder::new(identifier, store, metadata, host)
    }

    /// Application identifier, trimmed.
    pub fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    /// Name used in prompt copy.
    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    /// Configuration the gate was built with.
    pub fn config(&self) -> &RatingConfig {
        &self.inner.config
    }

    /// Snapshot of the persisted record.
    pub fn state(&self) -> RatingState {
        self.inner.state.snapshot()
    }

    /// Phase of the outstanding prompt, if any.
    pub fn prompt_phase(&self) -> PromptPhase {
        self.inner.dispatcher.phase()
    }

    /// Record an app launch or return to foreground.
    ///
    /// Returns a handle when this call scheduled a prompt.
    pub fn record_use(&self) -> Option<PromptHandle> {
        self.track(Counter::Use, true)
    }

    /// Record a significant event. The prompt is only considered when
    /// `can_prompt` is true; otherwise the event is counted silently.
    pub fn record_significant_event(&self, can_prompt: bool) -> Option<PromptHandle> {
        self.track(Counter::SignificantEvent, can_prompt)
    }

    /// Whether the prompt may be shown now.
    pub fn is_eligible(&self) -> bool {
        self.inner.eligibility().is_eligible()
    }

    /// Eligibility with the failing condition, if any.
    pub fn eligibility(&self) -> Eligibility {
        self.inner.eligibility()
    }

    /// Schedule the prompt without checking eligibility.
    pub fn show_prompt(&self) -> Option<PromptHandle> {
        let request = if self.inner.config.use_native_review_flow {
            PromptRequest::Native
        } else {
            PromptRequest::Choice(self.inner.choice_prompt())
        };

        let inner = Arc::clone(&self.inner);
        let handle = self
            .inner
            .dispatcher
            .schedule(request, self.inner.config.prompt_delay(), move |choice| inner.apply_choice(choice));

        if handle.is_none() {
            self.inner.debug_log("prompt already outstanding");
        }
        handle
    }

    /// The prompt the gate would present right now.
    pub fn choice_prompt(&self) -> ChoicePrompt {
        self.inner.choice_prompt()
    }

    /// Mark the current version as rated and open the review page.
    pub fn rate(&self) {
        self.inner.rate();
    }

    /// Store listing URL for this application.
    pub fn review_url(&self) -> String {
        self.inner.review_url()
    }

    /// Restart tracking for the running version: archive the current
    /// decisions and reset every counter.
    pub fn reset_all_counters(&self) {
        let Some(version) = self.running_version() else {
            return;
        };
        let _guard = self.inner.lock_tracker();
        self.inner.debug_log("resetting all counters");
        tracker::roll_over(&self.inner.state, &version, self.inner.now());
        self.inner.state.flush();
    }

    /// Restart the install clock and use count only.
    pub fn reset_usage_counters(&self) {
        let _guard = self.inner.lock_tracker();
        tracker::reset_usage(&self.inner.state, self.inner.now());
        self.inner.state.flush();
    }

    /// The app is leaving the foreground: cancel or dismiss any prompt.
    pub fn app_will_resign_active(&self) -> bool {
        self.inner.debug_log("app will resign active");
        self.inner.dispatcher.cancel()
    }

    /// React to one lifecycle event.
    pub fn handle_lifecycle(&self, event: LifecycleEvent) -> Option<PromptHandle> {
        self.inner.debug_log(format!("lifecycle event: {}", event));
        match event {
            LifecycleEvent::Launched | LifecycleEvent::WillEnterForeground => self.record_use(),
            LifecycleEvent::WillResignActive => {
                self.app_will_resign_active();
                None
            }
        }
    }

    /// Consume lifecycle events until the source ends. Counter updates run on
    /// the blocking pool. Returns the number of events handled.
    pub async fn run<S: LifecycleSource>(&self, mut source: S) -> usize {
        let mut handled = 0;
        while let Some(event) = source.next_event().await {
            handled += 1;
            match event {
                LifecycleEvent::WillResignActive => {
                    self.handle_lifecycle(event);
                }
                LifecycleEvent::Launched | LifecycleEvent::WillEnterForeground => {
                    let gate = self.clone();
                    if let Err(e) = tokio::task::spawn_blocking(move || gate.handle_lifecycle(event)).await {
                        log::error!("Usage tracking task failed: {}", e);
                    }
                }
            }
        }
        handled
    }

    fn running_version(&self) -> Option<String> {
        let version = self.inner.metadata.current_version();
        if version.is_none() {
            log::warn!("Application metadata reports no version; skipping rating bookkeeping");
        }
        version
    }

    fn track(&self, counter: Counter, can_prompt: bool) -> Option<PromptHandle> {
        let version = self.running_version()?;

        {
            let _guard = self.inner.lock_tracker();
            let change = tracker::track(&self.inner.state, &self.inner.config, &version, self.inner.now(), counter);
            self.inner.debug_log(change);
        }

        if !can_prompt {
            self.inner.debug_log("significant event recorded without prompting");
            return None;
        }

        if self.inner.eligibility().is_eligible() {
            self.show_prompt()
        } else {
            None
        }
    }
}
