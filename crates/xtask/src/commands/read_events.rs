//! Decrypt and list the audit event log
//!
//! Reads every complete record of `events.log`. Payloads are decrypted with
//! the configured key; a record that fails to decrypt is shown as such and
//! the listing continues.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::collections::BTreeMap;
use std::path::PathBuf;

use runtime::cipher::DEFAULT_ROUNDS;
use runtime::{Cipher, EVENT_LOG_FILE, EventRecord, FileEventLog};

use crate::dirs;

/// Decrypt and list the audit event log
#[derive(Parser)]
pub struct ReadEvents {
    /// Custom data directory (defaults to `SAVE_DATA_DIR` or the platform location)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Save password (defaults to `TIME_TERMINAL_SAVE_KEY`)
    #[arg(short, long, value_name = "KEY")]
    key: Option<String>,

    /// PBKDF2 iterations the log was written with
    #[arg(long, default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Only show records of this kind (e.g. `solve`, `unlock`)
    #[arg(long, value_name = "KIND")]
    kind: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "list")]
    format: OutputFormat,

    /// Limit number of records to display (0 = unlimited)
    #[arg(short, long, default_value = "100")]
    limit: usize,

    /// Skip first N records
    #[arg(long, default_value = "0")]
    skip: usize,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Record counts per kind
    Summary,
    /// One line per record with its decrypted payload
    List,
    /// Full JSON output
    Json,
}

impl ReadEvents {
    pub fn execute(self) -> Result<()> {
        let data_dir = self.data_dir.clone().unwrap_or_else(dirs::data_dir);
        let path = data_dir.join(EVENT_LOG_FILE);
        if !path.exists() {
            anyhow::bail!(
                "Event log not found: {}\n\nHint: Run the client first to record events.",
                path.display()
            );
        }

        let records = FileEventLog::read_records(&path)
            .with_context(|| format!("Failed to read event log: {}", path.display()))?;

        let selected: Vec<&EventRecord> = records
            .iter()
            .filter(|r| self.kind.as_deref().is_none_or(|k| r.kind == k))
            .skip(self.skip)
            .take(if self.limit == 0 { usize::MAX } else { self.limit })
            .collect();

        println!("{} {}", style("Event Log:").bold().cyan(), path.display());
        println!("{} {}", style("Total Records:").bold().cyan(), records.len());
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&records),
            OutputFormat::List => {
                let key = dirs::save_key(self.key.clone()).context("No save key configured")?;
                let cipher = Cipher::with_rounds(self.rounds);
                for record in selected {
                    print_record(&cipher, record, &key);
                }
            }
            OutputFormat::Json => {
                let key = dirs::save_key(self.key.clone()).context("No save key configured")?;
                let cipher = Cipher::with_rounds(self.rounds);
                let rows: Vec<serde_json::Value> = selected
                    .into_iter()
                    .map(|record| {
                        let payload = FileEventLog::decrypt_payload(&cipher, record, &key)
                            .unwrap_or(serde_json::Value::Null);
                        serde_json::json!({
                            "id": record.id,
                            "ts": record.ts,
                            "kind": record.kind,
                            "payload": payload,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }

        Ok(())
    }
}

fn print_summary(records: &[EventRecord]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.kind.as_str()).or_default() += 1;
    }

    println!("{}", style("=== Events by Kind ===").bold().green());
    for (kind, count) in counts {
        println!("  {:<12} {}", kind, count);
    }
}

fn print_record(cipher: &Cipher, record: &EventRecord, key: &str) {
    let at = chrono::DateTime::from_timestamp(record.ts, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.ts.to_string());

    let payload = match FileEventLog::decrypt_payload(cipher, record, key) {
        Ok(value) => value.to_string(),
        Err(e) => style(format!("<{e}>")).red().to_string(),
    };

    println!(
        "{:>5} {} {:<12} {}",
        style(record.id).dim(),
        style(at).dim(),
        style(&record.kind).yellow(),
        payload
    );
}
