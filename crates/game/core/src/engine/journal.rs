//! Ordered side effects requested by the engine.
//!
//! The engine itself performs no I/O. Every operation appends
//! [`Directive`]s to a [`Journal`]; the runtime drains the journal in order
//! and carries them out (printing, persisting, logging, mounting modules).
use crate::config::FinalUnlockPolicy;
use crate::state::NodeId;

/// Audit event mirrored into the encrypted event log and the event bus.
#[derive(Clone, Debug, PartialEq, Eq, strum::AsRefStr, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum GameEvent {
    EnterNode {
        node: NodeId,
        score: i64,
    },
    Unlock {
        node: NodeId,
        reason: String,
    },
    Solve {
        node: NodeId,
        game: String,
        points: i64,
        score: i64,
    },
    MountGame {
        node: NodeId,
        game: String,
    },
    StoryNext {
        node: NodeId,
        to: usize,
    },
    StoryAll {
        node: NodeId,
    },
    Hint {
        node: NodeId,
        hint: String,
        cost: i64,
        score: i64,
    },
    Penalty {
        node: NodeId,
        game: String,
        question: String,
        amount: i64,
        score: i64,
    },
    FinalUnlock {
        node: NodeId,
        policy: FinalUnlockPolicy,
    },
}

impl GameEvent {
    /// Kind tag stored beside the encrypted payload (`"enter_node"`, ...).
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Side effect requested by an engine operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Plain output line.
    Print(String),
    /// Dialogue line, revealed gradually by the presentation layer.
    Narrate { speaker: String, text: String },
    /// Append to the audit log.
    Log(GameEvent),
    /// Save the player state now.
    Persist,
    /// The current node changed: tear down node-scoped tasks and the module.
    NodeChanged(NodeId),
    /// Mount the puzzle module with this id.
    Mount(String),
    /// Replay the node's whole dialogue through the scheduler.
    ReplayStory(NodeId),
}

/// Buffer of directives produced by one or more engine calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Journal {
    directives: Vec<Directive>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, line: impl Into<String>) {
        self.directives.push(Directive::Print(line.into()));
    }

    pub fn narrate(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.directives.push(Directive::Narrate {
            speaker: speaker.into(),
            text: text.into(),
        });
    }

    pub fn log(&mut self, event: GameEvent) {
        self.directives.push(Directive::Log(event));
    }

    pub fn persist(&mut self) {
        self.directives.push(Directive::Persist);
    }

    pub fn push(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Printed lines, in order. Mostly useful for assertions.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Print(line) => Some(line.as_str()),
            _ => None,
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &GameEvent> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Log(event) => Some(event),
            _ => None,
        })
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Directive> {
        self.directives.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds_are_snake_case() {
        let event = GameEvent::EnterNode {
            node: NodeId::from("N2"),
            score: 4,
        };
        assert_eq!(event.kind(), "enter_node");
        let event = GameEvent::FinalUnlock {
            node: NodeId::from("N6"),
            policy: FinalUnlockPolicy::AnyCredential,
        };
        assert_eq!(event.kind(), "final_unlock");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn event_payload_carries_kind_tag() {
        let event = GameEvent::Unlock {
            node: NodeId::from("N2"),
            reason: "colors solved".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "unlock");
        assert_eq!(value["node"], "N2");
        assert_eq!(value["reason"], "colors solved");
    }
}
