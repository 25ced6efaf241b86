//! Tail client logs command
//!
//! Follows the terminal's log file in real-time, similar to `tail -f`.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dirs;

/// Monitor client logs in real-time
#[derive(Parser, Debug)]
pub struct TailLogs {
    /// Log file to follow (defaults to the terminal's log in the cache directory)
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Number of lines to show from history before tailing
    #[arg(short = 'n', long, default_value = "10")]
    pub lines: usize,

    /// Poll interval in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_interval: u64,
}

impl TailLogs {
    pub fn execute(self) -> Result<()> {
        let log_path = self
            .file
            .clone()
            .unwrap_or_else(|| dirs::log_dir().join(dirs::LOG_FILE));

        if !log_path.exists() {
            eprintln!("{}", style("✗ Log file not found").red().bold());
            eprintln!("  Path: {}", style(log_path.display()).dim());
            eprintln!();
            eprintln!("  Run the client first to generate logs:");
            eprintln!("    {}", style("cargo run -p time-terminal").cyan());
            anyhow::bail!("Log file does not exist");
        }

        println!("{}", style("Monitoring Time Terminal Logs").green().bold());
        println!("  Log file: {}", style(log_path.display()).dim());
        println!();

        self.tail_file(&log_path)
    }

    /// Prints the last N lines, then follows new content.
    fn tail_file(&self, path: &Path) -> Result<()> {
        let mut file = File::open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        for line in read_last_n_lines(&mut file, self.lines)? {
            println!("{}", line);
        }

        let mut reader = BufReader::new(file);
        let poll_interval = Duration::from_millis(self.poll_interval);

        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => std::thread::sleep(poll_interval),
                Ok(_) => print!("{}", line),
                Err(e) => {
                    eprintln!("{}", style(format!("Error reading log file: {}", e)).red());
                    anyhow::bail!("Failed to read log file");
                }
            }
        }
    }
}

/// Reads the whole file and keeps the last `n` lines. Leaves the cursor at
/// the end of the file.
fn read_last_n_lines(file: &mut File, n: usize) -> Result<Vec<String>> {
    file.seek(SeekFrom::Start(0))?;

    let lines: Vec<String> = BufReader::new(&mut *file)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .context("Failed to read lines from log file")?;

    file.seek(SeekFrom::End(0))?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn last_lines_are_kept_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(dirs::LOG_FILE);
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let mut file = File::open(&path).unwrap();
        assert_eq!(read_last_n_lines(&mut file, 2).unwrap(), vec!["two", "three"]);
        assert_eq!(read_last_n_lines(&mut file, 10).unwrap().len(), 3);
    }
}
