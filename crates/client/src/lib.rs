//! Top-level client orchestrating the Runtime and Frontend layers.
//!
//! # Architecture
//!
//! ```text
//! Client (Top-level container)
//!   ├─→ Runtime (session worker, persistence, event bus)
//!   └─→ Frontend (terminal input and rendering)
//! ```
//!
//! The frontend only ever sees a [`runtime::RuntimeHandle`]; the client owns
//! the runtime and shuts it down once the frontend returns.

mod builder;
pub mod config;
pub mod frontend;
pub mod logging;
pub mod terminal;

pub use builder::ClientBuilder;
pub use config::ClientConfig;
pub use frontend::Frontend;
pub use terminal::TerminalFrontend;

use anyhow::Result;

/// Top-level client container.
///
/// # Lifecycle
///
/// 1. `Client::builder()` assembles the layers
/// 2. `Client::run()` hands a runtime handle to the frontend
/// 3. The frontend boots the session and runs until quit or end of input
/// 4. The runtime is shut down, which makes the final save
pub struct Client {
    runtime: runtime::Runtime,
    frontend: Box<dyn Frontend>,
}

impl Client {
    /// Create a new ClientBuilder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Run the client until the frontend exits.
    ///
    /// # Errors
    ///
    /// Returns the frontend's error, or a runtime error from shutdown.
    pub async fn run(self) -> Result<()> {
        let mut frontend = self.frontend;
        let frontend_result = frontend.run(self.runtime.handle()).await;

        if let Err(e) = &frontend_result {
            tracing::error!("Frontend error: {e:#}");
        }
        self.runtime.shutdown().await?;

        frontend_result
    }
}
