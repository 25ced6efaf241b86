//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! submitting input or streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot};

use game_core::PlayerState;

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Result of submitting one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The player quit; the worker is stopping after its final save.
    pub quit: bool,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Greet the player and resume the saved game (or ask for a name).
    ///
    /// Subscribe to [`Topic::Output`] first to see the greeting.
    pub async fn boot(&self) -> Result<()> {
        self.request(|reply| Command::Boot { reply }).await
    }

    /// Submit one line of player input
    pub async fn submit(&self, line: impl Into<String>) -> Result<SubmitOutcome> {
        let line = line.into();
        self.request(|reply| Command::Submit { line, reply }).await
    }

    /// Query the current player state (read-only snapshot)
    pub async fn query_state(&self) -> Result<PlayerState> {
        self.request(|reply| Command::QueryState { reply }).await
    }

    /// Ask the worker to save and stop. Resolves once the final save is done.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Output` - Terminal output and session lifecycle
    /// - `Topic::Progress` - Audit events (unlocks, solves, hints, ...)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut output = handle.subscribe(Topic::Output);
    /// while let Ok(event) = output.recv().await {
    ///     // Render the event
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    ///
    /// Returns a map of topic to receiver for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
