//! rategate - decides when to ask a user to rate an application
//!
//! Tracks launches, foreground returns and significant events per app
//! version in a key-value store, and asks the host to show a rating prompt
//! once the configured usage thresholds are met.

pub mod clock;
pub mod error;
pub mod gate;
pub mod host;
pub mod lifecycle;
pub mod metadata;
pub mod state;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RateGateError, Result};
pub use gate::{
    Eligibility, IneligibleReason, NoopListener, PromptHandle, PromptOutcome, PromptPhase, PromptText, RatingConfig,
    RatingGate, RatingGateBuilder, RatingListener,
};
pub use host::{ChoicePrompt, PromptButtons, PromptChoice, ScriptedHost, UiHost};
pub use lifecycle::{ChannelLifecycleSource, LifecycleEvent, LifecycleSource};
pub use metadata::{AppMetadata, StaticMetadata};
pub use state::{RatingState, StateStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StoredValue};
