//! One player's terminal session.
//!
//! [`Session`] pairs the [`CommandRouter`] with the [`SessionContext`] it
//! dispatches into. It is synchronous and single-owner: the session worker
//! drives it from one task, feeding input lines and elapsed time, and drains
//! the output and progress events it accumulates.
mod commands;
mod context;
mod output;

pub use context::{STORY_LINE_GAP, SessionContext, SessionTask};
pub use output::{OutputSink, REVEAL_CUSHION};

use std::sync::Arc;
use std::time::Duration;

use game_core::{GameConfig, GameEvent, PlayerState};

use crate::command::{CommandContext, CommandRouter};
use crate::events::{OutputEvent, SessionEvent};
use crate::repository::{EventLog, SaveStore};

/// Delay between revealed characters.
pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(14);

/// Source of unix seconds, used for the hint cooldown.
pub type Clock = Box<dyn Fn() -> u64 + Send>;

/// Words that still work before a name is registered.
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

pub struct SessionOptions {
    pub char_delay: Duration,
    /// Seeds module randomness. `None` draws from the OS.
    pub seed: Option<u64>,
    pub clock: Clock,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            char_delay: DEFAULT_CHAR_DELAY,
            seed: None,
            clock: Box::new(|| chrono::Utc::now().timestamp().max(0) as u64),
        }
    }
}

impl SessionOptions {
    pub fn with_char_delay(mut self, char_delay: Duration) -> Self {
        self.char_delay = char_delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }
}

pub struct Session {
    router: CommandRouter<SessionContext>,
    cx: SessionContext,
}

impl Session {
    pub fn new(
        config: Arc<GameConfig>,
        saves: Box<dyn SaveStore>,
        log: Box<dyn EventLog>,
        options: SessionOptions,
    ) -> Self {
        let mut router = CommandRouter::new();
        commands::register(&mut router);
        Self {
            router,
            cx: SessionContext::new(config, saves, log, options),
        }
    }

    pub fn state(&self) -> &PlayerState {
        self.cx.state()
    }

    pub fn context(&self) -> &SessionContext {
        &self.cx
    }

    pub fn is_quitting(&self) -> bool {
        self.cx.is_quitting()
    }

    pub fn is_registered(&self) -> bool {
        self.cx.state().player_name.is_some()
    }

    /// Greets the player and resumes the saved game, or asks for a name.
    pub fn boot(&mut self) {
        let title = self.cx.config().meta.title.clone();
        let sink = self.cx.sink();
        sink.line(format!("Welcome to {title}."));
        sink.line("The narrator speaks first... because the world is frozen.");

        match self.cx.load_save() {
            Some(saved) if saved.player_name.is_some() => {
                self.cx.restore(saved);
                let name = self.cx.state().player_name.clone().unwrap_or_default();
                tracing::info!(target: "runtime::session", player = %name, "save loaded");
                self.cx
                    .sink()
                    .line(format!("[SAVE] Loaded. Welcome back, {name}."));
                self.enter_current_node();
            }
            _ => {
                tracing::info!(target: "runtime::session", "no usable save, starting fresh");
                self.cx.reset();
                self.cx
                    .sink()
                    .line("[SETUP] No valid save found. Please enter your name.");
            }
        }
        self.cx.emit_status();
    }

    /// Handles one line of player input.
    pub fn submit(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || self.cx.is_quitting() {
            return;
        }
        self.cx.sink().line(format!("> {line}"));

        if self.is_registered() {
            self.router.run(&mut self.cx, line);
            if !self.cx.is_quitting() {
                self.cx.persist();
            }
        } else {
            self.register(line);
        }
        self.cx.emit_status();
    }

    fn register(&mut self, line: &str) {
        let first = line.split_whitespace().next().unwrap_or_default();
        if QUIT_WORDS.contains(&first) {
            self.cx.request_quit();
            return;
        }
        if self.router.contains(first) || self.router.aliases().contains_key(first) {
            self.cx
                .sink()
                .line("[LOCKED] Enter your name first.");
            return;
        }

        self.cx.set_player_name(line);
        if !self.cx.save_now() {
            self.cx.discard_save();
            self.cx.reset();
            self.cx
                .sink()
                .line("[ERR] Could not create the encrypted save. Please enter your name again.");
            return;
        }

        tracing::info!(target: "runtime::session", player = %line, "player registered");
        self.cx.sink().line(format!("Welcome, {line}."));
        self.cx.notify(SessionEvent::Registered);
        self.enter_current_node();
    }

    fn enter_current_node(&mut self) {
        let node = self.cx.state().current_node.clone();
        self.cx.with_engine(|engine| engine.enter_node(&node));
    }

    /// Advances scheduled continuations (reveals, story replay, module timers).
    pub fn advance(&mut self, elapsed: Duration) {
        self.cx.advance(elapsed);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.cx.next_deadline()
    }

    /// Stops the mounted module and makes a final save.
    pub fn shutdown(&mut self) {
        self.cx.unmount();
        if self.cx.persist() {
            tracing::info!(target: "runtime::session", "final save written");
        }
    }

    pub fn status_line(&mut self) -> String {
        self.cx.status_line()
    }

    pub fn take_output(&mut self) -> Vec<OutputEvent> {
        self.cx.take_output()
    }

    pub fn take_progress(&mut self) -> Vec<GameEvent> {
        self.cx.take_progress()
    }

    pub fn take_notices(&mut self) -> Vec<SessionEvent> {
        self.cx.take_notices()
    }
}
