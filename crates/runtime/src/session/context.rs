//! Session-owned state and the plumbing that carries out engine directives.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use game_core::{
    Directive, GameConfig, GameEvent, Journal, ModuleContext, ModuleError, ModuleReport, NodeId,
    PlayerState, ProgressionEngine, ProgressionError, PuzzleModule, Scheduler, Surface, TaskId,
    Timers, create_module,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::output::OutputSink;
use super::{Clock, SessionOptions};
use crate::command::CommandContext;
use crate::events::{OutputEvent, SessionEvent};
use crate::repository::{EventLog, SaveStore};

/// Pause between lines of a `story all` replay.
pub const STORY_LINE_GAP: Duration = Duration::from_millis(120);

/// Delayed continuation owned by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTask {
    /// Next line of a `story all` replay.
    StoryLine { node: NodeId, index: usize },
    /// End of `sleep`.
    Wake,
    /// Timer requested by the mounted module.
    Module { module: &'static str, tag: u32 },
}

/// [`Timers`] view of the session scheduler for one module.
struct ModuleTimers<'s> {
    scheduler: &'s mut Scheduler<SessionTask>,
    module: &'static str,
}

impl Timers for ModuleTimers<'_> {
    fn schedule(&mut self, delay: Duration, tag: u32) -> TaskId {
        self.scheduler.schedule(
            delay,
            SessionTask::Module {
                module: self.module,
                tag,
            },
        )
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id).is_some()
    }
}

/// Everything one session owns. Handlers receive it by `&mut`.
pub struct SessionContext {
    state: PlayerState,
    config: Arc<GameConfig>,
    saves: Box<dyn SaveStore>,
    log: Box<dyn EventLog>,
    module: Option<Box<dyn PuzzleModule>>,
    scheduler: Scheduler<SessionTask>,
    sink: OutputSink,
    clock: Clock,
    rng: StdRng,
    progress: Vec<GameEvent>,
    notices: Vec<SessionEvent>,
    quitting: bool,
}

impl SessionContext {
    pub fn new(
        config: Arc<GameConfig>,
        saves: Box<dyn SaveStore>,
        log: Box<dyn EventLog>,
        options: SessionOptions,
    ) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            state: PlayerState::fresh(config.start_node()),
            config,
            saves,
            log,
            module: None,
            scheduler: Scheduler::new(),
            sink: OutputSink::new(options.char_delay),
            clock: options.clock,
            rng,
            progress: Vec::new(),
            notices: Vec::new(),
            quitting: false,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn module_id(&self) -> Option<&'static str> {
        self.module.as_ref().map(|m| m.id())
    }

    /// Id and report of the mounted module.
    pub fn module_report(&self) -> Option<(&'static str, ModuleReport)> {
        self.module.as_ref().map(|m| (m.id(), m.report()))
    }

    /// Unix seconds from the session clock.
    pub fn now(&self) -> u64 {
        (self.clock)()
    }

    /// Runs one engine operation and carries out its directives in order.
    pub fn with_engine<R>(&mut self, f: impl FnOnce(&mut ProgressionEngine<'_>) -> R) -> R {
        let config = Arc::clone(&self.config);
        let mut journal = Journal::new();
        let result = f(&mut ProgressionEngine::new(
            &mut self.state,
            &config,
            &mut journal,
        ));
        self.apply(journal);
        result
    }

    fn apply(&mut self, mut journal: Journal) {
        for directive in journal.drain() {
            match directive {
                Directive::Print(line) => self.sink.line(line),
                Directive::Narrate { speaker, text } => self.sink.narrate_line(&speaker, &text),
                Directive::Log(event) => self.record(event),
                Directive::Persist => {
                    self.persist();
                }
                Directive::NodeChanged(node) => {
                    tracing::debug!(target: "runtime::session", node = %node, "node changed");
                    self.cancel_story();
                    self.unmount();
                }
                Directive::Mount(id) => {
                    if let Err(err) = self.mount(&id) {
                        self.sink.line(err.to_string());
                    }
                }
                Directive::ReplayStory(node) => {
                    self.cancel_story();
                    self.scheduler
                        .schedule(Duration::ZERO, SessionTask::StoryLine { node, index: 0 });
                }
            }
        }
    }

    /// Mirrors an audit event into the event log and the progress feed.
    fn record(&mut self, event: GameEvent) {
        match serde_json::to_value(&event) {
            Ok(payload) => self.log.log(event.kind(), &payload),
            Err(err) => {
                tracing::trace!(target: "runtime::session", kind = event.kind(), error = %err, "event not serializable");
            }
        }
        self.progress.push(event);
    }

    /// Saves the state once a player name exists. Returns whether it was persisted.
    pub fn persist(&mut self) -> bool {
        if self.state.player_name.is_none() {
            return false;
        }
        self.saves.save(&self.state)
    }

    /// Replaces the mounted module with `id`.
    pub fn mount(&mut self, id: &str) -> Result<(), ProgressionError> {
        let seed = self.rng.random::<u64>();
        let mut module = create_module(id, &self.config, seed)
            .ok_or_else(|| ProgressionError::UnknownPuzzle(id.to_owned()))?;

        self.unmount();
        if !module.is_allowed_here(&self.state.current_node) {
            return Err(ProgressionError::Unavailable(
                "That game is not available in this node.".into(),
            ));
        }

        module.mount(&mut self.sink);
        let game = module.id().to_owned();
        self.module = Some(module);
        if let Some(Err(err)) = self.with_module(|module, cx| module.start(cx)) {
            tracing::trace!(target: "runtime::session", game = %game, error = %err, "module start failed");
        }

        tracing::debug!(target: "runtime::session", game = %game, "module mounted");
        self.record(GameEvent::MountGame {
            node: self.state.current_node.clone(),
            game,
        });
        Ok(())
    }

    /// Stops the mounted module and cancels its timers.
    pub fn unmount(&mut self) {
        if let Some(mut module) = self.module.take() {
            module.stop();
        }
        self.scheduler
            .cancel_where(|task| matches!(task, SessionTask::Module { .. }));
    }

    fn with_module<R>(
        &mut self,
        f: impl FnOnce(&mut dyn PuzzleModule, &mut ModuleContext<'_>) -> R,
    ) -> Option<R> {
        let module = self.module.as_deref_mut()?;
        let mut timers = ModuleTimers {
            scheduler: &mut self.scheduler,
            module: module.id(),
        };
        let mut cx = ModuleContext::new(
            &mut self.sink,
            &mut timers,
            &mut self.state.answers,
            &self.state.current_node,
        );
        Some(f(module, &mut cx))
    }

    fn cancel_story(&mut self) {
        self.scheduler
            .cancel_where(|task| matches!(task, SessionTask::StoryLine { .. }));
    }

    /// Moves the session clock forward and runs every task that came due.
    pub fn advance(&mut self, elapsed: Duration) {
        self.scheduler.advance(elapsed);
        self.sink.set_now(self.scheduler.now());
        while let Some((_, task)) = self.scheduler.pop_due() {
            self.run_task(task);
        }
    }

    /// Time until the next scheduled task, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    fn run_task(&mut self, task: SessionTask) {
        match task {
            SessionTask::Wake => self.sink.line("[OK] awake"),
            SessionTask::StoryLine { node, index } => self.replay_line(node, index),
            SessionTask::Module { module, tag } => {
                if self.module_id() != Some(module) {
                    return;
                }
                if let Some(Err(err)) = self.with_module(|m, cx| m.on_timer(tag, cx)) {
                    tracing::trace!(target: "runtime::session", module, tag, error = %err, "module timer failed");
                }
            }
        }
    }

    fn replay_line(&mut self, node: NodeId, index: usize) {
        if node != self.state.current_node {
            return;
        }
        let config = Arc::clone(&self.config);
        let Some(line) = config.node_or_empty(node.as_str()).intro.get(index) else {
            self.with_engine(|engine| engine.finish_story_replay(&node));
            return;
        };

        let text = line.rendered();
        let pace = self.sink.char_delay() * text.chars().count() as u32 + STORY_LINE_GAP;
        let revealed = self.sink.reveal(text);
        self.scheduler.schedule(
            revealed.max(pace),
            SessionTask::StoryLine {
                node,
                index: index + 1,
            },
        );
    }

    pub fn status_line(&mut self) -> String {
        self.with_engine(|engine| engine.status_line())
    }

    pub(super) fn emit_status(&mut self) {
        let status = self.status_line();
        self.sink.status(status);
    }

    pub(super) fn sink(&mut self) -> &mut OutputSink {
        &mut self.sink
    }

    pub(super) fn notify(&mut self, notice: SessionEvent) {
        self.notices.push(notice);
    }

    /// Adopts a loaded save, repairing invariants against the current story.
    pub(super) fn restore(&mut self, mut state: PlayerState) {
        let start = self.config.start_node();
        if !self.config.nodes.is_empty() && !self.config.contains(state.current_node.as_str()) {
            tracing::warn!(
                target: "runtime::session",
                node = %state.current_node,
                "saved node not in story, restarting from {start}"
            );
            state.current_node = start.clone();
        }
        state.repair_invariants(&start);
        self.state = state;
    }

    /// Drops all progress and starts over from the story's first node.
    pub(super) fn reset(&mut self) {
        self.state = PlayerState::fresh(self.config.start_node());
    }

    pub(super) fn set_player_name(&mut self, name: &str) {
        self.state.player_name = Some(name.to_owned());
    }

    pub(super) fn save_now(&mut self) -> bool {
        self.saves.save(&self.state)
    }

    pub(super) fn discard_save(&mut self) {
        if let Err(err) = self.saves.discard() {
            tracing::debug!(target: "runtime::session", error = %err, "discard failed");
        }
    }

    pub(super) fn load_save(&self) -> Option<PlayerState> {
        self.saves.load()
    }

    pub fn take_output(&mut self) -> Vec<OutputEvent> {
        self.sink.take()
    }

    pub fn take_progress(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.progress)
    }

    pub fn take_notices(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.notices)
    }
}

impl CommandContext for SessionContext {
    fn print(&mut self, line: &str) {
        self.sink.line(line);
    }

    fn clear_screen(&mut self) {
        self.cancel_story();
        self.sink.clear();
    }

    fn offer_to_module(&mut self, cmd: &str, args: &[String]) -> Result<bool, ModuleError> {
        self.with_module(|module, cx| module.on_command(cmd, args, cx))
            .unwrap_or(Ok(false))
    }

    fn vars_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.state.vars
    }

    fn player_name(&self) -> Option<&str> {
        self.state.player_name.as_deref()
    }

    fn schedule_wake(&mut self, delay: Duration) {
        self.scheduler.schedule(delay, SessionTask::Wake);
    }

    fn request_quit(&mut self) {
        self.unmount();
        self.persist();
        self.quitting = true;
        self.notices.push(SessionEvent::Ended);
    }
}
