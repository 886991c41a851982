//! Application lifecycle events.
//!
//! The host forwards its platform notifications through a `LifecycleSource`;
//! the gate has no knowledge of how they are produced.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Lifecycle transitions the gate reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The app finished launching
    Launched,
    /// The app is about to leave the foreground
    WillResignActive,
    /// The app is returning to the foreground
    WillEnterForeground,
}

impl LifecycleEvent {
    /// Short name used in logs and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Launched => "launched",
            LifecycleEvent::WillResignActive => "will-resign-active",
            LifecycleEvent::WillEnterForeground => "will-enter-foreground",
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stream of lifecycle events.
#[async_trait]
pub trait LifecycleSource: Send {
    /// Next event, or `None` once the source is exhausted.
    async fn next_event(&mut self) -> Option<LifecycleEvent>;
}

/// Lifecycle source fed through a tokio channel.
#[derive(Debug)]
pub struct ChannelLifecycleSource {
    rx: mpsc::Receiver<LifecycleEvent>,
}

impl ChannelLifecycleSource {
    /// Create a source and the sender the host uses to feed it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<LifecycleEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl LifecycleSource for ChannelLifecycleSource {
    async fn next_event(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }
}
