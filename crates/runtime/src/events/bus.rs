//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use game_core::GameEvent;

use super::types::{OutputEvent, SessionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Terminal output and session lifecycle
    Output,
    /// Audit events (unlocks, solves, hints, ...)
    Progress,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Output(OutputEvent),
    Session(SessionEvent),
    Progress(GameEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Output(_) | Event::Session(_) => Topic::Output,
            Event::Progress(_) => Topic::Progress,
        }
    }
}

struct Channels {
    output: broadcast::Sender<Event>,
    progress: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Output => &self.output,
            Topic::Progress => &self.progress,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                output: broadcast::channel(capacity).0,
                progress: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::NodeId;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut output = bus.subscribe(Topic::Output);
        let mut progress = bus.subscribe(Topic::Progress);

        bus.publish(Event::Output(OutputEvent::Line("hello".into())));
        bus.publish(Event::Progress(GameEvent::StoryAll {
            node: NodeId::from("N1"),
        }));

        assert!(matches!(
            output.recv().await.unwrap(),
            Event::Output(OutputEvent::Line(line)) if line == "hello"
        ));
        assert!(matches!(progress.recv().await.unwrap(), Event::Progress(_)));
        assert!(output.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(Event::Session(SessionEvent::Ended));
    }
}
