//! Content factory locating the story document inside a data directory.

use std::path::{Path, PathBuf};

use game_core::GameConfig;

use crate::loaders::{ConfigLoader, LoadResult};

/// Candidate file names, in lookup order.
const CANDIDATES: [&str; 3] = ["Config.json", "config.json", "config.toml"];

/// Loads content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// └── Config.json   (or config.json / config.toml)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the story document: the first candidate that exists, or
    /// `Config.json` when none does.
    pub fn config_path(&self) -> PathBuf {
        CANDIDATES
            .iter()
            .map(|name| self.data_dir.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| self.data_dir.join(CANDIDATES[0]))
    }

    /// Load the story document, failing on any error.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        ConfigLoader::load(&self.config_path())
    }

    /// Load the story document with the never-failing fallback policy.
    pub fn load_config_or_default(&self) -> GameConfig {
        ConfigLoader::load_or_default(&self.config_path())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
        assert_eq!(factory.config_path(), Path::new("/tmp/data/Config.json"));
    }

    #[test]
    fn test_factory_prefers_existing_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[meta]\ntitle = \"X\"\n").unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.config_path(), dir.path().join("config.toml"));
        assert_eq!(factory.load_config().unwrap().meta.title, "X");
    }
}
