//! In-memory repository implementations for testing and development.

mod event;
mod save;

pub use event::InMemoryEventLog;
pub use save::InMemorySaveStore;
