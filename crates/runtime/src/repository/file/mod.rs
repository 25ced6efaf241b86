//! File-based repository implementations.

mod event_log;
mod save;

pub use event_log::{EVENT_LOG_FILE, EventRecord, FileEventLog};
pub use save::{FileSaveStore, SAVE_FILE};
