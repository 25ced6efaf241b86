//! In-memory event log implementation.

use std::sync::{Arc, RwLock};

use crate::repository::{EventLog, RepositoryError, Result};

/// In-memory event log for testing and development.
///
/// Payloads are kept in plain JSON. Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    records: Arc<RwLock<Vec<(String, serde_json::Value)>>>,
}

impl InMemoryEventLog {
    /// Create a new empty in-memory event log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all records (for testing/debugging).
    pub fn get_all(&self) -> Result<Vec<(String, serde_json::Value)>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.clone())
    }

    /// Kind tags in append order.
    pub fn kinds(&self) -> Vec<String> {
        self.get_all()
            .map(|records| records.into_iter().map(|(kind, _)| kind).collect())
            .unwrap_or_default()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&mut self, kind: &str, payload: &serde_json::Value) -> Result<u64> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.push((kind.to_owned(), payload.clone()));
        Ok(records.len() as u64)
    }
}
