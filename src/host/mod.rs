//! UI host interface.
//!
//! The gate never draws anything. It hands a `ChoicePrompt` to the host and
//! awaits the user's answer; the host is responsible for running the prompt
//! on whatever thread owns its UI.

mod scripted;

use async_trait::async_trait;

pub use scripted::ScriptedHost;

/// Button labels for the choice prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptButtons {
    pub cancel: String,
    pub rate: String,
    /// Absent when reminders are disabled
    pub remind_later: Option<String>,
}

/// A prompt asking the user to rate the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoicePrompt {
    pub title: String,
    pub message: String,
    pub buttons: PromptButtons,
}

/// The user's answer to a choice prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Open the store listing
    Rate,
    /// Never ask again for this version
    Decline,
    /// Ask again after the reminder period
    RemindLater,
    /// Closed without choosing
    Dismissed,
}

/// Host application surface used by the prompt dispatcher.
#[async_trait]
pub trait UiHost: Send + Sync {
    /// Present the prompt and resolve with the user's choice.
    ///
    /// The future is dropped if the app leaves the foreground while the
    /// prompt is up; `dismiss_prompt` is called right after.
    async fn present_choice_prompt(&self, prompt: &ChoicePrompt) -> PromptChoice;

    /// Tear down a visible prompt without a choice.
    fn dismiss_prompt(&self) {}

    /// Open the store's review page.
    fn open_review_url(&self, url: &str);

    /// Ask the platform to show its own review flow.
    fn request_native_review(&self);
}
