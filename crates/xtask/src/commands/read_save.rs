//! Decrypt and inspect the save file
//!
//! Reads `save.dat`, decrypts it with the configured key and displays the
//! player state it holds.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;

use game_core::PlayerState;
use runtime::cipher::DEFAULT_ROUNDS;
use runtime::{Cipher, FileSaveStore};

use crate::dirs;

/// Decrypt and print the save file
#[derive(Parser)]
pub struct ReadSave {
    /// Custom data directory (defaults to `SAVE_DATA_DIR` or the platform location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Save password (defaults to `TIME_TERMINAL_SAVE_KEY`)
    #[arg(short, long, value_name = "KEY")]
    key: Option<String>,

    /// PBKDF2 iterations the save was written with
    #[arg(long, default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Name, node, score and progress
    Summary,
    /// Full JSON output
    Json,
}

impl ReadSave {
    pub fn execute(self) -> Result<()> {
        let data_dir = self.data_dir.unwrap_or_else(dirs::data_dir);
        let key = dirs::save_key(self.key).context("No save key configured")?;

        let store = FileSaveStore::new(&data_dir, Cipher::with_rounds(self.rounds), Some(key));
        let state = store
            .read()
            .with_context(|| format!("Failed to decrypt {}", store.path().display()))?;

        let Some(state) = state else {
            println!(
                "{} {}",
                style("No save file at").dim(),
                style(store.path().display()).dim()
            );
            return Ok(());
        };

        println!("{} {}", style("Save File:").bold().cyan(), store.path().display());
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&state),
            OutputFormat::Json => print_json(&state)?,
        }

        Ok(())
    }
}

fn print_summary(state: &PlayerState) {
    println!("{}", style("=== Player State Summary ===").bold().green());
    println!();

    println!("{}", style("Player:").bold().yellow());
    println!(
        "  Name: {}",
        state.player_name.as_deref().unwrap_or("(unregistered)")
    );
    println!("  Score: {}", state.score);
    println!("  Current Node: {}", state.current_node);
    println!();

    println!("{}", style("Progress:").bold().yellow());
    let unlocked: Vec<&str> = state.unlocked_nodes.iter().map(|n| n.as_str()).collect();
    println!("  Unlocked: {}", unlocked.join(", "));
    let solved: Vec<&str> = state
        .solved
        .iter()
        .filter(|(_, done)| **done)
        .map(|(id, _)| id.as_str())
        .collect();
    println!(
        "  Solved: {}",
        if solved.is_empty() { "(none)".to_owned() } else { solved.join(", ") }
    );
    println!("  Fragments: {}", state.tokens.len());
    match state.last_hint_ts.and_then(|ts| chrono::DateTime::from_timestamp(ts as i64, 0)) {
        Some(at) => println!("  Last Hint: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Last Hint: never"),
    }
    println!();

    if !state.vars.is_empty() {
        println!("{}", style("Vars:").bold().yellow());
        for (key, value) in &state.vars {
            println!("  {key} = {value}");
        }
        println!();
    }
}

fn print_json(state: &PlayerState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to serialize state to JSON")?;
    println!("{}", json);
    Ok(())
}
