//! In-memory SaveStore implementation for tests and local runs.

use std::sync::{Arc, RwLock};

use game_core::PlayerState;

use crate::repository::{RepositoryError, Result, SaveStore};

/// In-memory save slot.
///
/// Clones share the same slot, so a test can keep one clone and hand the
/// other to the runtime.
#[derive(Clone, Default)]
pub struct InMemorySaveStore {
    slot: Arc<RwLock<Option<PlayerState>>>,
}

impl InMemorySaveStore {
    /// Create a new empty in-memory slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot already holding `state`.
    pub fn with_state(state: PlayerState) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(state))),
        }
    }

    /// Current contents of the slot.
    pub fn snapshot(&self) -> Result<Option<PlayerState>> {
        let slot = self
            .slot
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(slot.clone())
    }
}

impl SaveStore for InMemorySaveStore {
    fn load(&self) -> Option<PlayerState> {
        self.snapshot().ok().flatten()
    }

    fn try_save(&self, state: &PlayerState) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *slot = Some(state.clone());
        Ok(())
    }

    fn discard(&self) -> Result<()> {
        let mut slot = self
            .slot
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        *slot = None;
        Ok(())
    }
}
