//! Worker tasks that back the runtime orchestration.
//!
//! The session worker owns the player's session and is the only place where
//! input is executed, time is advanced and output is published.

mod session;

pub use session::{Command, SessionWorker};
