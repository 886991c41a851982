//! Scripted UI host for tests and headless demos.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{ChoicePrompt, PromptChoice, UiHost};

/// Answers prompts from a queue of pre-recorded choices.
///
/// When the queue is empty the prompt stays up until the dispatcher
/// dismisses it, which models a user who never answers.
#[derive(Debug, Default)]
pub struct ScriptedHost {
    choices: Mutex<VecDeque<PromptChoice>>,
    presented: Mutex<Vec<ChoicePrompt>>,
    opened_urls: Mutex<Vec<String>>,
    native_requests: AtomicUsize,
    dismissals: AtomicUsize,
    shown: Notify,
}

impl ScriptedHost {
    /// Create a host with no queued answers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a host that answers with `choices`, in order.
    pub fn with_choices(choices: impl IntoIterator<Item = PromptChoice>) -> Self {
        let host = Self::new();
        host.choices.lock().unwrap_or_else(|e| e.into_inner()).extend(choices);
        host
    }

    /// Queue another answer.
    pub fn push_choice(&self, choice: PromptChoice) {
        self.choices.lock().unwrap_or_else(|e| e.into_inner()).push_back(choice);
    }

    /// Every prompt presented so far.
    pub fn presented(&self) -> Vec<ChoicePrompt> {
        self.presented.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every review URL opened so far.
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How many times the native review flow was requested.
    pub fn native_requests(&self) -> usize {
        self.native_requests.load(Ordering::SeqCst)
    }

    /// How many times a visible prompt was dismissed by the dispatcher.
    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }

    /// Wait until a prompt has been presented.
    pub async fn wait_until_presented(&self) {
        self.shown.notified().await;
    }
}

#[async_trait]
impl UiHost for ScriptedHost {
    async fn present_choice_prompt(&self, prompt: &ChoicePrompt) -> PromptChoice {
        self.presented.lock().unwrap_or_else(|e| e.into_inner()).push(prompt.clone());
        let next = self.choices.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        self.shown.notify_one();

        match next {
            Some(choice) => choice,
            None => std::future::pending().await,
        }
    }

    fn dismiss_prompt(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }

    fn open_review_url(&self, url: &str) {
        self.opened_urls.lock().unwrap_or_else(|e| e.into_inner()).push(url.to_string());
    }

    fn request_native_review(&self) {
        self.native_requests.fetch_add(1, Ordering::SeqCst);
    }
}
