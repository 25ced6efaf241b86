//! Clean save data and logs command
//!
//! Removes the terminal's persistent data:
//! - Logs (cache directory)
//! - Save file and event log (data directory)
//!
//! Always prompts for confirmation before deletion unless `-y` is given.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;

use runtime::{EVENT_LOG_FILE, SAVE_FILE};

use crate::dirs;

/// Clean save data and logs
#[derive(Parser, Debug)]
pub struct Clean {
    /// Clean only logs (cache directory)
    #[arg(long)]
    pub logs: bool,

    /// Clean only save data (data directory)
    #[arg(long)]
    pub data: bool,

    /// Custom data directory (defaults to `SAVE_DATA_DIR` or the platform location)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip confirmation prompt (dangerous!)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        // No flag means both
        let clean_logs = self.logs || !self.data;
        let clean_data = self.data || !self.logs;

        let data_dir = self.data_dir.clone().unwrap_or_else(dirs::data_dir);
        let targets = collect_targets(clean_logs, clean_data, &dirs::log_dir(), &data_dir);

        if targets.is_empty() {
            println!("{}", style("Nothing to clean - no files exist yet").dim());
            return Ok(());
        }

        println!("{}", style("Clean Time Terminal Data").yellow().bold());
        println!();
        println!("The following will be deleted:");
        for (label, path) in &targets {
            println!("  {} {}", style("→").cyan(), style(label).bold());
            println!("    {}", style(path.display()).dim());
        }
        println!();

        if !self.yes && !self.confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        for (label, path) in targets {
            print!("Deleting {}... ", label);
            io::stdout().flush()?;
            remove(&path)?;
            println!("{}", style("✓").green());
        }

        println!();
        println!("{}", style("✓ Cleanup complete!").green().bold());

        Ok(())
    }

    fn confirm(&self) -> Result<bool> {
        print!("{} ", style("Proceed? [y/N]").yellow().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }
}

/// Existing paths to delete. Only the files the terminal writes are removed
/// from the data directory, since `SAVE_DATA_DIR` may point at a shared folder.
fn collect_targets(
    logs: bool,
    data: bool,
    log_dir: &std::path::Path,
    data_dir: &std::path::Path,
) -> Vec<(String, PathBuf)> {
    let mut targets = Vec::new();

    if logs && log_dir.exists() {
        targets.push(("All logs".to_string(), log_dir.to_path_buf()));
    }

    if data {
        for (label, name) in [("Save file", SAVE_FILE), ("Event log", EVENT_LOG_FILE)] {
            let path = data_dir.join(name);
            if path.exists() {
                targets.push((label.to_string(), path));
            }
        }
    }

    targets
}

fn remove(path: &std::path::Path) -> Result<()> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.with_context(|| format!("Failed to delete: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn data_targets_are_limited_to_terminal_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SAVE_FILE), "blob").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let targets = collect_targets(false, true, &dir.path().join("logs"), dir.path());
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].1, dir.path().join(SAVE_FILE));

        for (_, path) in targets {
            remove(&path).unwrap();
        }
        assert!(!dir.path().join(SAVE_FILE).exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn missing_directories_yield_nothing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        assert!(collect_targets(true, true, &missing, &missing).is_empty());
    }
}
