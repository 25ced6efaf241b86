//! Client configuration loaded from the environment.
use std::env;
use std::path::PathBuf;

use game_content::{ConfigLoader, ContentFactory};
use game_core::GameConfig;
use runtime::RuntimeConfig;

/// Everything the binary needs before the runtime starts.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Story document. `None` looks for `Config.json` (or `config.json` /
    /// `config.toml`) in the working directory.
    pub content_path: Option<PathBuf>,
    pub runtime: RuntimeConfig,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TIME_TERMINAL_CONFIG` - Story document path (default: `./Config.json`)
    /// - everything [`RuntimeConfig::from_env`] reads
    pub fn from_env() -> Self {
        Self {
            content_path: env::var("TIME_TERMINAL_CONFIG").ok().map(PathBuf::from),
            runtime: RuntimeConfig::from_env(),
        }
    }

    pub fn content_path(&self) -> PathBuf {
        self.content_path
            .clone()
            .unwrap_or_else(|| ContentFactory::new(".").config_path())
    }

    /// Loads the story document. Never fails: see [`ConfigLoader::load_or_default`].
    pub fn load_content(&self) -> GameConfig {
        ConfigLoader::load_or_default(&self.content_path())
    }
}
