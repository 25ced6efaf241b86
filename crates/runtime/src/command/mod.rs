//! Terminal command dispatch.
//!
//! [`CommandRouter`] tokenizes a line like a shell, expands single-token
//! aliases, offers the command to the mounted puzzle module, and finally runs
//! a built-in or an application [`Handler`]. Everything it needs from the
//! session goes through [`CommandContext`].
mod router;
mod spec;

pub use router::{CommandRouter, HISTORY_CAPACITY, MAX_ALIAS_DEPTH};
pub use spec::{Action, Builtin, CommandSpec, Handler};

use std::collections::BTreeMap;
use std::time::Duration;

use game_core::{ModuleError, ProgressionError};
use thiserror::Error;

/// Failure of an application command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Rule-level rejection. Printed as-is; it already carries its prefix.
    #[error(transparent)]
    Rejected(#[from] ProgressionError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("{0}")]
    Failed(String),
}

/// Session services the router and built-ins rely on.
pub trait CommandContext {
    fn print(&mut self, line: &str);

    /// Clears the screen and cancels pending reveals.
    fn clear_screen(&mut self);

    /// First refusal for the mounted module. `Ok(true)` means consumed.
    fn offer_to_module(&mut self, cmd: &str, args: &[String]) -> Result<bool, ModuleError>;

    fn vars_mut(&mut self) -> &mut BTreeMap<String, String>;

    fn player_name(&self) -> Option<&str>;

    /// Prints `[OK] awake` once `delay` has passed.
    fn schedule_wake(&mut self, delay: Duration);

    /// Final save, then end the session.
    fn request_quit(&mut self);
}
