//! Topic-based event bus for runtime events.
//!
//! Presentation layers subscribe to [`Topic::Output`] for terminal lines;
//! observers that only care about progression subscribe to
//! [`Topic::Progress`].

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{OutputEvent, SessionEvent};
