//! Runtime orchestration for the time terminal.
//!
//! This crate wires the progression engine from `game-core` to encrypted
//! persistence, the command shell and a worker task that serializes all
//! access to the player's session. Consumers embed [`Runtime`] and talk to it
//! through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`session`] owns player state, output and scheduled continuations
//! - [`command`] tokenizes input and dispatches builtins and app commands
//! - [`cipher`] and [`repository`] encrypt and store saves and audit records
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod cipher;
pub mod command;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod session;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle, SubmitOutcome};
pub use cipher::{Cipher, CipherError};
pub use command::{CommandContext, CommandError, CommandRouter, CommandSpec};
pub use events::{Event, EventBus, OutputEvent, SessionEvent, Topic};
pub use repository::{
    EVENT_LOG_FILE, EventLog, EventRecord, FileEventLog, FileSaveStore, InMemoryEventLog,
    InMemorySaveStore, RepositoryError, SAVE_FILE, SaveStore,
};
pub use runtime::{DEFAULT_SAVE_KEY, Runtime, RuntimeBuilder, RuntimeConfig, default_save_dir};
pub use session::{Session, SessionOptions};
