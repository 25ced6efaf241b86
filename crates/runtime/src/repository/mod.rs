//! Repository layer for data that changes during play.
//!
//! - [`SaveStore`] holds the single encrypted progress slot
//! - [`EventLog`] appends encrypted audit records
//!
//! Story content is read-only and loaded by `game-content`, not here.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{EVENT_LOG_FILE, EventRecord, FileEventLog, FileSaveStore, SAVE_FILE};
pub use memory::{InMemoryEventLog, InMemorySaveStore};
pub use traits::{EventLog, SaveStore};
