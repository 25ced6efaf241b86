//! Time terminal binary.
//!
//! Composition root: loads configuration from the environment (and `.env`),
//! installs file logging, loads the story document, builds the runtime and
//! hands the terminal to the frontend.

use anyhow::Result;
use runtime::Runtime;
use time_terminal::{Client, ClientConfig, TerminalFrontend, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    let _log_guard = logging::setup_logging()?;

    tracing::info!("Starting time terminal");
    tracing::info!("Save directory: {}", config.runtime.save_dir.display());
    tracing::info!("Story document: {}", config.content_path().display());
    if config.runtime.save_key.is_none() {
        tracing::warn!("No save key configured; progress will not be saved");
    }

    let content = config.load_content();
    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .game_config(content)
        .build()?;

    let client = Client::builder()
        .runtime(runtime)
        .frontend(TerminalFrontend::stdio())
        .build()?;

    client.run().await?;

    tracing::info!("Client shutdown complete");
    Ok(())
}
