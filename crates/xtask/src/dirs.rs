//! Platform-specific directory utilities
//!
//! Resolves the same locations the terminal binary uses, honoring the same
//! environment overrides.

use std::path::PathBuf;

use runtime::RuntimeConfig;

/// Log file written by the terminal binary.
pub const LOG_FILE: &str = "time-terminal.log";

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/time-terminal/logs`
/// - Linux: `~/.cache/time-terminal/logs` (or `$XDG_CACHE_HOME/time-terminal/logs`)
/// - Windows: `%LOCALAPPDATA%\time-terminal\logs`
/// - Fallback: `/tmp/time-terminal/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "time-terminal")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/time-terminal"))
        .join("logs")
}

/// Get the save data directory
///
/// `SAVE_DATA_DIR` wins; otherwise the platform data directory
/// (`~/.local/share/time-terminal` on Linux), or `./save_data`.
pub fn data_dir() -> PathBuf {
    RuntimeConfig::from_env().save_dir
}

/// Save password: the explicit one, then `TIME_TERMINAL_SAVE_KEY`, then the default.
pub fn save_key(explicit: Option<String>) -> Option<String> {
    explicit
        .filter(|k| !k.is_empty())
        .or_else(|| RuntimeConfig::from_env().save_key)
}
