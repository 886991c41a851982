//! Prompt dispatch.
//!
//! Turns an eligibility decision into at most one outstanding prompt. The
//! prompt moves `Idle -> Scheduled -> Visible -> Idle`; backgrounding the app
//! cancels a scheduled prompt and dismisses a visible one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::listener::RatingListener;
use crate::host::{ChoicePrompt, PromptChoice, UiHost};

/// Where the outstanding prompt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPhase {
    /// No prompt outstanding
    Idle,
    /// Waiting out the configured delay
    Scheduled,
    /// Presented by the host
    Visible,
}

/// What to show once the delay elapses.
#[derive(Debug, Clone)]
pub enum PromptRequest {
    /// The choice prompt
    Choice(ChoicePrompt),
    /// The platform review flow
    Native,
}

/// How an outstanding prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user chose to rate
    RateChosen,
    /// The user declined
    Declined,
    /// The user asked to be reminded later
    RemindLater,
    /// The prompt closed without a decision
    Dismissed,
    /// The app left the foreground before the prompt was shown
    Cancelled,
    /// The platform review flow was requested
    NativeReviewRequested,
}

impl PromptOutcome {
    /// Short name used in logs and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptOutcome::RateChosen => "rate",
            PromptOutcome::Declined => "declined",
            PromptOutcome::RemindLater => "remind later",
            PromptOutcome::Dismissed => "dismissed",
            PromptOutcome::Cancelled => "cancelled",
            PromptOutcome::NativeReviewRequested => "native review requested",
        }
    }
}

impl std::fmt::Display for PromptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to a scheduled prompt.
#[derive(Debug)]
pub struct PromptHandle {
    handle: JoinHandle<PromptOutcome>,
}

impl PromptHandle {
    /// Wait for the prompt to end.
    pub async fn outcome(self) -> PromptOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Prompt task failed: {}", e);
                PromptOutcome::Dismissed
            }
        }
    }

    /// Whether the prompt has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

enum Slot {
    Idle,
    Scheduled(u64, oneshot::Sender<()>),
    Visible(u64, oneshot::Sender<()>),
}

struct SlotState {
    slot: Slot,
    next_generation: u64,
}

/// The prompt slot. Each scheduled prompt gets its own generation so a
/// finished task can only ever release its own claim.
#[derive(Clone)]
struct SharedSlot(Arc<Mutex<SlotState>>);

impl SharedSlot {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(SlotState {
            slot: Slot::Idle,
            next_generation: 0,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn phase(&self) -> PromptPhase {
        match self.lock().slot {
            Slot::Idle => PromptPhase::Idle,
            Slot::Scheduled(..) => PromptPhase::Scheduled,
            Slot::Visible(..) => PromptPhase::Visible,
        }
    }

    /// Idle -> Scheduled. None if a prompt is already outstanding.
    fn claim(&self) -> Option<(u64, oneshot::Receiver<()>)> {
        let mut state = self.lock();
        if !matches!(state.slot, Slot::Idle) {
            return None;
        }
        let generation = state.next_generation;
        state.next_generation = state.next_generation.wrapping_add(1);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        state.slot = Slot::Scheduled(generation, cancel_tx);
        Some((generation, cancel_rx))
    }

    /// Scheduled -> Visible. False if the prompt was cancelled meanwhile.
    fn promote(&self, generation: u64) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut state.slot, Slot::Idle) {
            Slot::Scheduled(current, cancel) if current == generation => {
                state.slot = Slot::Visible(current, cancel);
                true
            }
            other => {
                state.slot = other;
                false
            }
        }
    }

    /// Back to Idle, only if the slot still belongs to `generation`.
    fn release(&self, generation: u64) {
        let mut state = self.lock();
        let owned = match &state.slot {
            Slot::Scheduled(current, _) | Slot::Visible(current, _) => *current == generation,
            Slot::Idle => false,
        };
        if owned {
            state.slot = Slot::Idle;
        }
    }

    /// Signal the outstanding prompt, if any, and go back to Idle.
    fn cancel(&self) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut state.slot, Slot::Idle) {
            Slot::Idle => false,
            Slot::Scheduled(_, cancel) | Slot::Visible(_, cancel) => {
                let _ = cancel.send(());
                true
            }
        }
    }
}

/// Releases the task's claim when the task ends, including by panic.
struct ClaimGuard {
    slot: SharedSlot,
    generation: u64,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.slot.release(self.generation);
    }
}

/// Owns the single prompt slot and runs prompts on the tokio runtime.
pub struct PromptDispatcher {
    slot: SharedSlot,
    runtime: Handle,
    host: Arc<dyn UiHost>,
    listener: Arc<dyn RatingListener>,
}

impl PromptDispatcher {
    /// Create an idle dispatcher spawning onto `runtime`.
    pub fn new(runtime: Handle, host: Arc<dyn UiHost>, listener: Arc<dyn RatingListener>) -> Self {
        Self {
            slot: SharedSlot::new(),
            runtime,
            host,
            listener,
        }
    }

    /// Current phase of the slot.
    pub fn phase(&self) -> PromptPhase {
        self.slot.phase()
    }

    /// Schedule a prompt after `delay`.
    ///
    /// Returns `None` when a prompt is already outstanding. `on_choice` runs
    /// on the blocking pool with the user's answer and decides the outcome.
    pub fn schedule<F>(&self, request: PromptRequest, delay: Duration, on_choice: F) -> Option<PromptHandle>
    where
        F: FnOnce(PromptChoice) -> PromptOutcome + Send + 'static,
    {
        let (generation, cancel_rx) = self.slot.claim()?;

        let task = PromptTask {
            claim: ClaimGuard {
                slot: self.slot.clone(),
                generation,
            },
            host: Arc::clone(&self.host),
            listener: Arc::clone(&self.listener),
            cancel_rx,
        };
        let handle = self.runtime.spawn(task.run(request, delay, on_choice));
        Some(PromptHandle { handle })
    }

    /// Cancel a scheduled prompt or dismiss a visible one.
    ///
    /// Returns false when nothing was outstanding.
    pub fn cancel(&self) -> bool {
        self.slot.cancel()
    }
}

struct PromptTask {
    claim: ClaimGuard,
    host: Arc<dyn UiHost>,
    listener: Arc<dyn RatingListener>,
    cancel_rx: oneshot::Receiver<()>,
}

impl PromptTask {
    async fn run<F>(mut self, request: PromptRequest, delay: Duration, on_choice: F) -> PromptOutcome
    where
        F: FnOnce(PromptChoice) -> PromptOutcome + Send + 'static,
    {
        if !delay.is_zero() {
            tokio::select! {
                _ = &mut self.cancel_rx => return PromptOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let generation = self.claim.generation;
        if !self.claim.slot.promote(generation) {
            return PromptOutcome::Cancelled;
        }

        let prompt = match request {
            PromptRequest::Native => {
                self.host.request_native_review();
                self.claim.slot.release(generation);
                self.listener.on_native_review_requested();
                return PromptOutcome::NativeReviewRequested;
            }
            PromptRequest::Choice(prompt) => prompt,
        };

        self.listener.on_prompt_displayed();
        let choice = tokio::select! {
            choice = self.host.present_choice_prompt(&prompt) => Some(choice),
            _ = &mut self.cancel_rx => None,
        };

        let outcome = match choice {
            Some(choice) => {
                // Record writes may block on storage
                let outcome = match tokio::task::spawn_blocking(move || on_choice(choice)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        log::error!("Applying prompt choice failed: {}", e);
                        PromptOutcome::Dismissed
                    }
                };
                self.claim.slot.release(generation);
                outcome
            }
            None => {
                self.host.dismiss_prompt();
                PromptOutcome::Dismissed
            }
        };

        match outcome {
            PromptOutcome::RateChosen => self.listener.on_rate(),
            PromptOutcome::Declined => self.listener.on_decline(),
            PromptOutcome::RemindLater => self.listener.on_remind_later(),
            PromptOutcome::Dismissed => self.listener.on_dismissed(),
            PromptOutcome::Cancelled | PromptOutcome::NativeReviewRequested => {}
        }
        outcome
    }
}
