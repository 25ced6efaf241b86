//! Story document loader.

use std::path::Path;

use anyhow::Context;
use game_core::GameConfig;
use tracing::{info, warn};

use crate::loaders::{LoadResult, read_file};

/// Six-node timeline compiled into the binary.
pub const BUNDLED_CONFIG: &str = include_str!("../../data/config.json");

/// On-disk encoding, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` selects TOML; anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Loader for the story document.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a story document from a JSON or TOML file.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content, ConfigFormat::from_path(path))
            .with_context(|| format!("Failed to load story document {}", path.display()))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> LoadResult<GameConfig> {
        let config: GameConfig = match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config JSON: {}", e))?,
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?,
        };
        Ok(config)
    }

    /// The timeline shipped with the crate.
    pub fn bundled() -> LoadResult<GameConfig> {
        Self::parse(BUNDLED_CONFIG, ConfigFormat::Json).context("Bundled story document is invalid")
    }

    /// Loads `path`, never failing.
    ///
    /// A missing file is created from the bundled timeline. An unreadable or
    /// malformed one yields the empty default configuration.
    pub fn load_or_default(path: &Path) -> GameConfig {
        if !path.exists() {
            let config = Self::bundled().unwrap_or_else(|e| {
                warn!(error = %e, "bundled story unusable; starting empty");
                GameConfig::default()
            });
            match Self::write(path, &config) {
                Ok(()) => info!(path = %path.display(), "wrote bundled story document"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not write story document"),
            }
            return config;
        }

        match Self::load(path) {
            Ok(config) => {
                for issue in config.validate() {
                    warn!(path = %path.display(), %issue, "story document issue");
                }
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "falling back to empty configuration");
                GameConfig::default()
            }
        }
    }

    /// Writes `config` to `path` in the format its extension names.
    pub fn write(path: &Path, config: &GameConfig) -> LoadResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
            ConfigFormat::Toml => toml::to_string_pretty(config)?,
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{FinalUnlockPolicy, NodeId, PuzzleKind};
    use tempfile::TempDir;

    #[test]
    fn test_bundled_story_is_consistent() {
        let config = ConfigLoader::bundled().unwrap();
        assert_eq!(config.nodes.len(), 6);
        assert!(config.validate().is_empty());
        assert_eq!(config.goal_node(), Some(NodeId::from("N6")));
        assert_eq!(config.meta.final_unlock, FinalUnlockPolicy::AnyCredential);

        let chess = config.node("N2").unwrap().puzzle("chess").unwrap();
        assert_eq!(chess.kind(), PuzzleKind::Exact);
        assert_eq!(chess.solve_points, 15);
    }

    #[test]
    fn test_load_json_accepts_points_alias() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Config.json");
        std::fs::write(
            &path,
            r#"{"meta":{"title":"T","hint_cooldown_seconds":5},
               "nodes":{"N1":{"title":"A","games":[{"id":"colors","points":7}]}}}"#,
        )
        .unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.meta.hint_cooldown_seconds, 5);
        assert_eq!(config.meta.start_node, NodeId::from("N1"));
        let colors = config.node("N1").unwrap().puzzle("colors").unwrap();
        assert_eq!(colors.solve_points, 7);
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.toml");
        std::fs::write(
            &path,
            r#"
[meta]
title = "Toml Story"
final_unlock = "derived_password"

[nodes.N1]
title = "Start"
time = "10:30"
routes = ["N2"]

[nodes.N2]
title = "Next"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.meta.final_unlock, FinalUnlockPolicy::DerivedPassword);
        assert_eq!(config.node("N1").unwrap().minutes(), Some(30));
    }

    #[test]
    fn test_malformed_document_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(ConfigLoader::load(&path).is_err());
        assert_eq!(ConfigLoader::load_or_default(&path), GameConfig::default());
    }

    #[test]
    fn test_missing_document_is_created_from_bundle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("Config.json");

        let config = ConfigLoader::load_or_default(&path);

        assert_eq!(config.nodes.len(), 6);
        assert!(path.exists());
        assert_eq!(ConfigLoader::load(&path).unwrap(), config);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("Config")), ConfigFormat::Json);
    }
}
