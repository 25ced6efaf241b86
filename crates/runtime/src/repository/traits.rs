//! Repository contracts for the save slot and the audit log.

use game_core::PlayerState;

use super::Result;

/// Single-slot store for the player's progress.
///
/// Implementations never surface load failures: a missing, undecryptable or
/// unparsable save reads as "no save".
pub trait SaveStore: Send + Sync {
    fn load(&self) -> Option<PlayerState>;

    /// One write attempt, no recovery.
    fn try_save(&self, state: &PlayerState) -> Result<()>;

    /// Removes whatever is currently stored.
    fn discard(&self) -> Result<()>;

    /// Saves with a single repair attempt (discard, then retry once).
    ///
    /// Returns whether the state was persisted. Failures are logged and
    /// never propagate into gameplay.
    fn save(&self, state: &PlayerState) -> bool {
        let first = match self.try_save(state) {
            Ok(()) => {
                tracing::debug!(target: "runtime::repository", "state saved");
                return true;
            }
            Err(err) => err,
        };

        tracing::warn!(target: "runtime::repository", error = %first, "save failed, repairing");
        if let Err(err) = self.discard() {
            tracing::debug!(target: "runtime::repository", error = %err, "discard during repair failed");
        }

        match self.try_save(state) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(target: "runtime::repository", error = %err, "save abandoned after repair");
                false
            }
        }
    }
}

/// Append-only audit log of progression events.
///
/// Each record carries an auto-incrementing id, a unix timestamp, a kind tag
/// and an independently encrypted payload.
pub trait EventLog: Send {
    /// Appends one record and returns its id.
    fn append(&mut self, kind: &str, payload: &serde_json::Value) -> Result<u64>;

    /// Best-effort append. Failures are traced and dropped.
    fn log(&mut self, kind: &str, payload: &serde_json::Value) {
        if let Err(err) = self.append(kind, payload) {
            tracing::trace!(target: "runtime::repository", kind, error = %err, "event dropped");
        }
    }
}
