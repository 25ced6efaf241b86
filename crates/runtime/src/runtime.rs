//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the session.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use game_core::GameConfig;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::cipher::{Cipher, DEFAULT_ROUNDS, MIN_ROUNDS};
use crate::events::EventBus;
use crate::repository::{EventLog, FileEventLog, FileSaveStore, SaveStore};
use crate::session::{DEFAULT_CHAR_DELAY, Session, SessionOptions};
use crate::workers::{Command, SessionWorker};

/// Password used when none is configured.
pub const DEFAULT_SAVE_KEY: &str = "Test";

/// Platform data directory for saves, `./save_data` when none exists.
pub fn default_save_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "time-terminal")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory holding `save.dat` and `events.log`.
    pub save_dir: PathBuf,
    /// Password for the save and the event log. `None` disables both.
    pub save_key: Option<String>,
    /// PBKDF2 iterations; raised to [`MIN_ROUNDS`] when lower.
    pub kdf_rounds: u32,
    pub char_delay: Duration,
    /// Seeds module randomness for reproducible runs.
    pub seed: Option<u64>,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            save_key: Some(DEFAULT_SAVE_KEY.to_owned()),
            kdf_rounds: DEFAULT_ROUNDS,
            char_delay: DEFAULT_CHAR_DELAY,
            seed: None,
            event_buffer_size: 256,
            command_buffer_size: 32,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SAVE_DATA_DIR` - Directory for save data (default: platform-specific)
    /// - `TIME_TERMINAL_SAVE_KEY` - Save password (default: `Test`; empty disables saving)
    /// - `TIME_TERMINAL_REVEAL_MS` - Milliseconds per revealed character (default: 14)
    /// - `TIME_TERMINAL_COMMAND_BUFFER` - Command queue size (default: 32)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("SAVE_DATA_DIR") {
            config.save_dir = PathBuf::from(dir);
        }

        if let Ok(key) = env::var("TIME_TERMINAL_SAVE_KEY") {
            config.save_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Some(ms) = read_env::<u64>("TIME_TERMINAL_REVEAL_MS") {
            config.char_delay = Duration::from_millis(ms);
        }

        if let Some(capacity) = read_env::<usize>("TIME_TERMINAL_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        config
    }

    pub fn cipher(&self) -> Cipher {
        Cipher::with_rounds(self.kdf_rounds.max(MIN_ROUNDS))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

/// Main runtime that orchestrates the player session
///
/// Design: Runtime owns the worker and coordinates shutdown.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shutdown the runtime gracefully
    ///
    /// Asks the worker for a final save if it is still running, then waits
    /// for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        match self.handle.shutdown().await {
            Ok(()) | Err(RuntimeError::CommandChannelClosed) => {}
            Err(RuntimeError::ReplyChannelClosed(_)) => {
                tracing::debug!(target: "runtime", "worker stopped before replying to shutdown");
            }
            Err(err) => return Err(err),
        }
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }

    /// Wait for the worker to stop on its own (after `quit`).
    pub async fn join(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    game_config: Option<GameConfig>,
    save_store: Option<Box<dyn SaveStore>>,
    event_log: Option<Box<dyn EventLog>>,
    clock: Option<crate::session::Clock>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            game_config: None,
            save_store: None,
            event_log: None,
            clock: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Story content. Defaults to an empty configuration.
    pub fn game_config(mut self, game_config: GameConfig) -> Self {
        self.game_config = Some(game_config);
        self
    }

    /// Replace the encrypted save file (e.g. with an in-memory store)
    pub fn save_store(mut self, store: impl SaveStore + 'static) -> Self {
        self.save_store = Some(Box::new(store));
        self
    }

    /// Replace the encrypted event log
    pub fn event_log(mut self, log: impl EventLog + 'static) -> Self {
        self.event_log = Some(Box::new(log));
        self
    }

    /// Replace the unix-seconds clock used for hint cooldowns
    pub fn clock(mut self, clock: impl Fn() -> u64 + Send + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Build the runtime and spawn its worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let config = self.config;
        let game_config = Arc::new(self.game_config.unwrap_or_default());

        let uses_files = self.save_store.is_none() || self.event_log.is_none();
        if uses_files {
            std::fs::create_dir_all(&config.save_dir).map_err(|e| RuntimeError::Repository(e.into()))?;
        }

        let save_store = self.save_store.unwrap_or_else(|| {
            Box::new(FileSaveStore::new(
                &config.save_dir,
                config.cipher(),
                config.save_key.clone(),
            ))
        });
        let event_log = self.event_log.unwrap_or_else(|| {
            Box::new(FileEventLog::new(
                &config.save_dir,
                config.cipher(),
                config.save_key.clone(),
            ))
        });

        let mut options = SessionOptions::default().with_char_delay(config.char_delay);
        if let Some(seed) = config.seed {
            options = options.with_seed(seed);
        }
        if let Some(clock) = self.clock {
            options.clock = clock;
        }

        tracing::info!(
            target: "runtime",
            title = %game_config.meta.title,
            nodes = game_config.nodes.len(),
            save_dir = %config.save_dir.display(),
            "building runtime"
        );

        let session = Session::new(game_config, save_store, event_log, options);
        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        let handle = RuntimeHandle::new(command_tx, event_bus.clone());
        let worker = SessionWorker::new(session, command_rx, event_bus);

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            worker_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_never_drops_below_the_floor() {
        let config = RuntimeConfig {
            kdf_rounds: 10,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.cipher().rounds(), MIN_ROUNDS);
    }

    #[test]
    fn default_config_uses_the_fallback_key() {
        let config = RuntimeConfig::default();
        assert_eq!(config.save_key.as_deref(), Some(DEFAULT_SAVE_KEY));
        assert_eq!(config.kdf_rounds, DEFAULT_ROUNDS);
    }
}
