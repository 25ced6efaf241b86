//! File-based [`SaveStore`] implementation.

use std::fs;
use std::path::{Path, PathBuf};

use game_core::PlayerState;

use crate::cipher::Cipher;
use crate::repository::{RepositoryError, Result, SaveStore};

pub const SAVE_FILE: &str = "save.dat";

/// Encrypted single-slot save file.
///
/// # File Format
///
/// `save.dat` holds one [`Cipher`] blob whose plaintext is the JSON form of
/// [`PlayerState`]. Maps in the state are ordered, so equal states produce
/// equal plaintexts.
///
/// Writes go to `save.dat.tmp` first and are renamed into place.
pub struct FileSaveStore {
    path: PathBuf,
    cipher: Cipher,
    password: Option<String>,
}

impl FileSaveStore {
    /// The directory is created on first save.
    pub fn new(base_dir: impl AsRef<Path>, cipher: Cipher, password: Option<String>) -> Self {
        Self {
            path: base_dir.as_ref().join(SAVE_FILE),
            cipher,
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Like [`SaveStore::load`] but reports why nothing could be read.
    pub fn read(&self) -> Result<Option<PlayerState>> {
        let password = self.password.as_deref().ok_or(RepositoryError::MissingKey)?;
        if !self.path.exists() {
            return Ok(None);
        }

        let blob = fs::read_to_string(&self.path)?;
        let plaintext = self.cipher.decrypt(&blob, password)?;
        let state = serde_json::from_slice(&plaintext)?;
        Ok(Some(state))
    }
}

impl SaveStore for FileSaveStore {
    fn load(&self) -> Option<PlayerState> {
        match self.read() {
            Ok(state) => {
                tracing::debug!("Loaded save from {}", self.path.display());
                state
            }
            Err(err) => {
                tracing::debug!(error = %err, "Ignoring unreadable save {}", self.path.display());
                None
            }
        }
    }

    fn try_save(&self, state: &PlayerState) -> Result<()> {
        let password = self.password.as_deref().ok_or(RepositoryError::MissingKey)?;
        let plaintext = serde_json::to_vec(state)?;
        let blob = self.cipher.encrypt(&plaintext, password)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("dat.tmp");
        fs::write(&temp_path, blob)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    fn discard(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::debug!("Deleted {}", self.path.display());
        }
        Ok(())
    }
}
