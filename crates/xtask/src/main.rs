//! Development tasks for the time terminal
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{Clean, ReadEvents, ReadSave, TailLogs};

/// Development tasks for the time terminal
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the time terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Decrypt and print the save file
    ReadSave(ReadSave),

    /// Decrypt and list the audit event log
    ReadEvents(ReadEvents),

    /// Monitor client logs in real-time
    TailLogs(TailLogs),

    /// Clean save data and logs
    Clean(Clean),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for SAVE_DATA_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::ReadSave(cmd) => cmd.execute(),
        Command::ReadEvents(cmd) => cmd.execute(),
        Command::TailLogs(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
    }
}
