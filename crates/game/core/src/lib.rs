//! Deterministic progression rules and data types for the time terminal.
//!
//! `game-core` defines the canonical content model, player state, engine and
//! puzzle modules, and exposes pure APIs reused by the runtime and tooling.
//! All state mutation flows through [`engine::ProgressionEngine`]; side
//! effects are described in a [`engine::Journal`] and carried out by callers.
pub mod config;
pub mod engine;
pub mod puzzle;
pub mod schedule;
pub mod state;

pub use config::{
    DialogueLine, FinalUnlockPolicy, GameConfig, HintSpec, MetaConfig, NodeConfig, PuzzleKind,
    PuzzleSpec,
};
pub use engine::{
    ActiveModule, AwardOutcome, Directive, GameEvent, Journal, ProgressionEngine,
    ProgressionError, ProgressionResult, derive_final_password,
};
pub use puzzle::{
    ModuleContext, ModuleError, ModuleReport, PuzzleModule, Surface, Timers, create_module,
};
pub use schedule::{Scheduler, TaskId};
pub use state::{NodeId, PlayerState};
