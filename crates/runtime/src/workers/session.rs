//! Session worker that owns the authoritative [`Session`].
//!
//! Receives commands from [`crate::RuntimeHandle`], feeds input lines and
//! elapsed wall-clock time into the session, and publishes whatever output
//! and progression events it produced to the [`EventBus`].

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use game_core::PlayerState;

use crate::api::SubmitOutcome;
use crate::events::{Event, EventBus};
use crate::session::Session;

/// Commands that can be sent to the session worker
pub enum Command {
    /// Greet the player and load the save. Only the first boot has an effect.
    Boot { reply: oneshot::Sender<()> },
    /// Handle one line of player input.
    Submit {
        line: String,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    /// Query the current player state (read-only).
    QueryState { reply: oneshot::Sender<PlayerState> },
    /// Make a final save and stop the worker.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Background task that serializes all access to one session.
pub struct SessionWorker {
    session: Session,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    last_tick: Instant,
    booted: bool,
}

impl SessionWorker {
    pub fn new(session: Session, command_rx: mpsc::Receiver<Command>, event_bus: EventBus) -> Self {
        Self {
            session,
            command_rx,
            event_bus,
            last_tick: Instant::now(),
            booted: false,
        }
    }

    /// Main worker loop.
    ///
    /// Runs until `quit` is accepted, a shutdown is requested, or every
    /// handle is dropped. A final save is attempted in each case.
    pub async fn run(mut self) {
        let mut shutdown_reply = None;
        loop {
            let deadline = self.session.next_deadline();
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    self.tick();
                    match cmd {
                        Some(cmd) => {
                            if let ControlFlow::Break(reply) = self.handle_command(cmd) {
                                shutdown_reply = reply;
                                break;
                            }
                        }
                        None => {
                            debug!(target: "runtime::worker", "all handles dropped");
                            break;
                        }
                    }
                }
                _ = wait(deadline) => self.tick(),
            }
            self.publish();
            if self.session.is_quitting() {
                info!(target: "runtime::worker", "session ended by player");
                break;
            }
        }

        if !self.session.is_quitting() {
            self.session.shutdown();
        }
        self.publish();
        if let Some(reply) = shutdown_reply
            && reply.send(()).is_err()
        {
            debug!(target: "runtime::worker", "Shutdown reply channel closed (caller dropped)");
        }
    }

    /// Output is published before replying, so a caller that awaited the
    /// reply finds everything its request produced already on the bus.
    fn handle_command(&mut self, cmd: Command) -> ControlFlow<Option<oneshot::Sender<()>>> {
        match cmd {
            Command::Boot { reply } => {
                if self.booted {
                    debug!(target: "runtime::worker", "ignoring repeated boot");
                } else {
                    self.booted = true;
                    self.session.boot();
                }
                self.publish();
                if reply.send(()).is_err() {
                    debug!(target: "runtime::worker", "Boot reply channel closed (caller dropped)");
                }
            }
            Command::Submit { line, reply } => {
                self.session.submit(&line);
                let outcome = SubmitOutcome {
                    quit: self.session.is_quitting(),
                };
                self.publish();
                if reply.send(outcome).is_err() {
                    debug!(target: "runtime::worker", "Submit reply channel closed (caller dropped)");
                }
            }
            Command::QueryState { reply } => {
                if reply.send(self.session.state().clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryState reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown { reply } => return ControlFlow::Break(Some(reply)),
        }
        ControlFlow::Continue(())
    }

    /// Moves the session clock by the wall-clock time since the last tick.
    fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.session.advance(elapsed);
    }

    fn publish(&mut self) {
        for event in self.session.take_output() {
            self.event_bus.publish(Event::Output(event));
        }
        for event in self.session.take_progress() {
            self.event_bus.publish(Event::Progress(event));
        }
        for notice in self.session.take_notices() {
            self.event_bus.publish(Event::Session(notice));
        }
    }
}

async fn wait(deadline: Option<Duration>) {
    match deadline {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
