//! Trait describing a runnable client front-end.
use anyhow::Result;
use async_trait::async_trait;
use runtime::RuntimeHandle;

/// Frontend abstraction for UI layers.
///
/// Frontends talk to the game only through [`RuntimeHandle`]: they subscribe
/// to output, submit input lines and boot the session. They never own the
/// runtime.
#[async_trait]
pub trait Frontend: Send {
    /// Run the frontend until the player quits or input ends.
    ///
    /// Implementations must return only after everything the session
    /// printed has been shown.
    async fn run(&mut self, handle: RuntimeHandle) -> Result<()>;
}
