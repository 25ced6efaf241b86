//! Event payloads carried on the bus.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One unit of terminal output, in the order the session produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputEvent {
    /// Print immediately.
    Line(String),
    /// Reveal character by character, `char_delay` apart.
    Reveal { text: String, char_delay: Duration },
    /// Wipe the terminal.
    Clear,
    /// Status bar contents (`name | Node id (time) | Score n`).
    Status(String),
}

impl OutputEvent {
    /// Text of a printable event.
    pub fn text(&self) -> Option<&str> {
        match self {
            OutputEvent::Line(text) | OutputEvent::Reveal { text, .. } => Some(text),
            OutputEvent::Clear | OutputEvent::Status(_) => None,
        }
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The player's name is set and the first node was entered.
    Registered,
    /// `quit` was accepted; the worker stops after its final save.
    Ended,
}
