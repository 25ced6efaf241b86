//! Puzzle modules: self-contained mini-games mounted beside the terminal.
//!
//! A module gets first refusal on every command while it is mounted, may
//! schedule delayed continuations through [`Timers`], and reports a single
//! result back to the engine through [`PuzzleModule::report`]. Win
//! conditions stay inside the module; the engine only sees the report.
mod chess;
mod chromatic;
pub mod codes;
mod final_lock;
mod nim;
mod registry;
pub mod regex_storm;
mod tictactoe;

pub use chess::ChessFork;
pub use chromatic::{ChromaticDrift, combinations};
pub use codes::CodeObservatory;
pub use final_lock::AxisLock;
pub use nim::NimLab;
pub use registry::{MODULE_IDS, create_module};
pub use regex_storm::PatternStorm;
pub use tictactoe::TicTacToeSequence;

use std::collections::BTreeMap;
use std::time::Duration;

use crate::schedule::TaskId;
use crate::state::NodeId;

/// Output surface a module writes to.
pub trait Surface {
    fn print_line(&mut self, text: &str);

    /// Dialogue-style line, revealed gradually where the presentation can.
    fn narrate_line(&mut self, speaker: &str, text: &str) {
        self.print_line(&format!("{speaker}: {text}"));
    }
}

/// Delayed continuations owned by the mounted module.
///
/// Tasks are delivered back through [`PuzzleModule::on_timer`] with their
/// tag, and cancelled automatically when the module is unmounted.
pub trait Timers {
    fn schedule(&mut self, delay: Duration, tag: u32) -> TaskId;
    fn cancel(&mut self, id: TaskId) -> bool;
}

/// Everything a module may touch while handling a hook.
pub struct ModuleContext<'a> {
    pub surface: &'a mut dyn Surface,
    pub timers: &'a mut dyn Timers,
    /// Persistent answer scratch shared with the engine's validators.
    pub answers: &'a mut BTreeMap<String, String>,
    pub node: &'a NodeId,
}

impl<'a> ModuleContext<'a> {
    pub fn new(
        surface: &'a mut dyn Surface,
        timers: &'a mut dyn Timers,
        answers: &'a mut BTreeMap<String, String>,
        node: &'a NodeId,
    ) -> Self {
        Self {
            surface,
            timers,
            answers,
            node,
        }
    }

    pub fn print(&mut self, text: impl AsRef<str>) {
        self.surface.print_line(text.as_ref());
    }
}

/// Result a module reports to the `solve` validators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ModuleReport {
    #[default]
    Pending,
    Success,
    Failure,
}

impl ModuleReport {
    pub fn is_success(&self) -> bool {
        matches!(self, ModuleReport::Success)
    }
}

/// Failure raised from a module hook.
///
/// Interception errors are ignorable: the router traces them and keeps
/// dispatching as if the module had declined.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error("invalid input for {module}: {reason}")]
    InvalidInput {
        module: &'static str,
        reason: String,
    },

    #[error("{module} is in an inconsistent state: {reason}")]
    Inconsistent {
        module: &'static str,
        reason: String,
    },
}

/// Mountable mini-game. Every hook has a no-op default.
pub trait PuzzleModule: Send {
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn is_allowed_here(&self, _node: &NodeId) -> bool {
        true
    }

    /// Renders the module's panel.
    fn mount(&mut self, surface: &mut dyn Surface) {
        surface.print_line(&format!("[GAME] {}", self.title()));
    }

    fn start(&mut self, cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        cx.print(format!("[GAME] {} started.", self.title()));
        Ok(())
    }

    fn stop(&mut self) {}

    /// Returns `Ok(true)` when the module consumed the command.
    fn on_command(
        &mut self,
        _cmd: &str,
        _args: &[String],
        _cx: &mut ModuleContext<'_>,
    ) -> Result<bool, ModuleError> {
        Ok(false)
    }

    fn on_timer(&mut self, _tag: u32, _cx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn report(&self) -> ModuleReport {
        ModuleReport::Pending
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory surface and timers for module tests.
    use super::*;

    #[derive(Default)]
    pub struct Transcript {
        pub lines: Vec<String>,
    }

    impl Surface for Transcript {
        fn print_line(&mut self, text: &str) {
            self.lines.push(text.to_owned());
        }
    }

    impl Transcript {
        pub fn contains(&self, needle: &str) -> bool {
            self.lines.iter().any(|l| l.contains(needle))
        }
    }

    #[derive(Default)]
    pub struct ManualTimers {
        scheduler: crate::schedule::Scheduler<u32>,
    }

    impl Timers for ManualTimers {
        fn schedule(&mut self, delay: Duration, tag: u32) -> TaskId {
            self.scheduler.schedule(delay, tag)
        }

        fn cancel(&mut self, id: TaskId) -> bool {
            self.scheduler.cancel(id).is_some()
        }
    }

    impl ManualTimers {
        pub fn pending(&self) -> usize {
            self.scheduler.len()
        }

        /// Fast-forwards past every scheduled task and returns their tags in order.
        pub fn take_all(&mut self) -> Vec<u32> {
            self.scheduler.advance(Duration::from_secs(3600));
            std::iter::from_fn(|| self.scheduler.pop_due().map(|(_, tag)| tag)).collect()
        }
    }

    /// Owns the pieces a [`ModuleContext`] borrows.
    pub struct Harness {
        pub surface: Transcript,
        pub timers: ManualTimers,
        pub answers: BTreeMap<String, String>,
        pub node: NodeId,
    }

    impl Harness {
        pub fn new(node: &str) -> Self {
            Self {
                surface: Transcript::default(),
                timers: ManualTimers::default(),
                answers: BTreeMap::new(),
                node: NodeId::from(node),
            }
        }

        pub fn cx(&mut self) -> ModuleContext<'_> {
            ModuleContext::new(
                &mut self.surface,
                &mut self.timers,
                &mut self.answers,
                &self.node,
            )
        }
    }

    pub fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
