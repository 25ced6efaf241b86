//! Append-only encrypted audit log.
//!
//! # File Format
//!
//! ```text
//! [u32 length LE][bincode EventRecord]
//! [u32 length LE][bincode EventRecord]
//! ...
//! ```
//!
//! Each record's payload is its own [`Cipher`] blob with a fresh salt, so a
//! damaged record never affects its neighbours. A complete frame that no
//! longer decodes is skipped and left in place. Only a torn trailing frame
//! left by a crash is truncated the next time the log is opened.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cipher::Cipher;
use crate::repository::{EventLog, RepositoryError, Result};

pub const EVENT_LOG_FILE: &str = "events.log";

const FRAME_HEADER: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 1, strictly increasing.
    pub id: u64,
    /// Unix seconds.
    pub ts: i64,
    pub kind: String,
    /// Encrypted JSON payload.
    pub payload: String,
}

/// File-backed [`EventLog`]. The file is created on the first append.
pub struct FileEventLog {
    path: PathBuf,
    cipher: Cipher,
    password: Option<String>,
    file: Option<File>,
    next_id: u64,
}

impl FileEventLog {
    pub fn new(base_dir: impl AsRef<Path>, cipher: Cipher, password: Option<String>) -> Self {
        Self {
            path: base_dir.as_ref().join(EVENT_LOG_FILE),
            cipher,
            password: password.filter(|p| !p.is_empty()),
            file: None,
            next_id: 1,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every complete record in the log at `path`.
    ///
    /// A missing file is an empty log. Undecodable frames are skipped and
    /// reading stops at a torn tail.
    pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(path)?;
        Ok(scan(&bytes).records)
    }

    /// Decrypts and parses one record's payload.
    pub fn decrypt_payload(
        cipher: &Cipher,
        record: &EventRecord,
        password: &str,
    ) -> Result<serde_json::Value> {
        let plaintext = cipher.decrypt(&record.payload, password)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn writer(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            self.file = Some(self.open()?);
        }
        self.file
            .as_mut()
            .ok_or_else(|| RepositoryError::CorruptedData("event log not open".into()))
    }

    fn open(&mut self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let existing = if self.path.exists() {
            fs::read(&self.path)?
        } else {
            Vec::new()
        };
        let scan = scan(&existing);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if scan.skipped > 0 {
            tracing::warn!(
                skipped = scan.skipped,
                "Skipping undecodable records in {}",
                self.path.display()
            );
        }
        if scan.valid_len < existing.len() {
            tracing::warn!(
                "Truncating {} trailing bytes of {}",
                existing.len() - scan.valid_len,
                self.path.display()
            );
            file.set_len(scan.valid_len as u64)?;
        }

        self.next_id = scan.next_id();
        tracing::debug!(
            "Opened event log {} at record {}",
            self.path.display(),
            self.next_id
        );
        Ok(file)
    }
}

impl EventLog for FileEventLog {
    fn append(&mut self, kind: &str, payload: &serde_json::Value) -> Result<u64> {
        let password = self
            .password
            .clone()
            .ok_or(RepositoryError::MissingKey)?;
        let plaintext = serde_json::to_vec(payload)?;
        let sealed = self.cipher.encrypt(&plaintext, &password)?;

        // Opening scans existing records, which settles next_id.
        self.writer()?;
        let id = self.next_id;
        let record = EventRecord {
            id,
            ts: chrono::Utc::now().timestamp(),
            kind: kind.to_owned(),
            payload: sealed,
        };

        let bytes = bincode::serialize(&record)?;
        let mut frame = Vec::with_capacity(FRAME_HEADER + bytes.len());
        frame.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        frame.extend_from_slice(&bytes);

        let file = self.writer()?;
        file.write_all(&frame)?;
        file.flush()?;

        self.next_id += 1;
        Ok(id)
    }
}

struct Scan {
    records: Vec<EventRecord>,
    /// Bytes spanned by complete frames, decodable or not.
    valid_len: usize,
    /// Complete frames that failed to decode.
    skipped: usize,
}

impl Scan {
    /// Ids are issued one per frame starting at 1, so the frame count bounds
    /// the ids hidden inside skipped frames.
    fn next_id(&self) -> u64 {
        let highest = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        let frames = (self.records.len() + self.skipped) as u64;
        highest.max(frames) + 1
    }
}

fn scan(bytes: &[u8]) -> Scan {
    let mut records = Vec::new();
    let mut skipped = 0;
    let mut offset = 0;

    while offset + FRAME_HEADER <= bytes.len() {
        let mut len = [0u8; FRAME_HEADER];
        len.copy_from_slice(&bytes[offset..offset + FRAME_HEADER]);
        let len = u32::from_le_bytes(len) as usize;

        let start = offset + FRAME_HEADER;
        let Some(body) = start
            .checked_add(len)
            .and_then(|end| bytes.get(start..end))
        else {
            break;
        };

        match bincode::deserialize::<EventRecord>(body) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::trace!(offset, error = %err, "undecodable event record");
                skipped += 1;
            }
        }
        offset = start + len;
    }

    Scan {
        records,
        valid_len: offset,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cipher() -> Cipher {
        Cipher::with_rounds(32)
    }

    fn log(dir: &TempDir) -> FileEventLog {
        FileEventLog::new(dir.path(), cipher(), Some("Test".into()))
    }

    #[test]
    fn test_created_on_first_append() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        assert!(!events.path().exists());

        let id = events.append("unlock", &json!({"node": "N2"})).unwrap();
        assert_eq!(id, 1);
        assert!(events.path().exists());
    }

    #[test]
    fn test_records_are_sequential_and_decryptable() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        events.append("enter_node", &json!({"node": "N1"})).unwrap();
        events.append("solve", &json!({"game": "colors", "score": 10})).unwrap();

        let records = FileEventLog::read_records(events.path()).unwrap();
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(records[1].kind, "solve");

        let payload = FileEventLog::decrypt_payload(&cipher(), &records[1], "Test").unwrap();
        assert_eq!(payload["game"], "colors");
        assert!(FileEventLog::decrypt_payload(&cipher(), &records[1], "nope").is_err());
    }

    #[test]
    fn test_payload_salts_are_independent() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        events.append("hint", &json!({})).unwrap();
        events.append("hint", &json!({})).unwrap();

        let records = FileEventLog::read_records(events.path()).unwrap();
        assert_ne!(records[0].payload, records[1].payload);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = TempDir::new().unwrap();
        log(&dir).append("a", &json!(1)).unwrap();

        let mut reopened = log(&dir);
        assert_eq!(reopened.append("b", &json!(2)).unwrap(), 2);
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        events.append("a", &json!(1)).unwrap();
        drop(events);

        let path = dir.path().join(EVENT_LOG_FILE);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[200, 0, 0, 0, 1, 2, 3]).unwrap();
        drop(file);

        let mut events = log(&dir);
        assert_eq!(events.append("b", &json!(2)).unwrap(), 2);
        let kinds: Vec<_> = FileEventLog::read_records(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec!["a", "b"]);
    }

    #[test]
    fn test_damaged_middle_record_keeps_later_records() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        for kind in ["a", "b", "c"] {
            events.append(kind, &json!(kind)).unwrap();
        }
        drop(events);

        // The payload string closes frame b; an 0xFF byte makes it invalid UTF-8.
        let path = dir.path().join(EVENT_LOG_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let first_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let b_offset = FRAME_HEADER + first_len;
        let b_len =
            u32::from_le_bytes(bytes[b_offset..b_offset + 4].try_into().unwrap()) as usize;
        bytes[b_offset + FRAME_HEADER + b_len - 1] = 0xFF;
        fs::write(&path, &bytes).unwrap();

        let readable: Vec<_> = FileEventLog::read_records(&path)
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.kind))
            .collect();
        assert_eq!(readable, vec![(1, "a".to_string()), (3, "c".to_string())]);

        let mut events = log(&dir);
        assert_eq!(events.append("d", &json!("d")).unwrap(), 4);
        assert_eq!(fs::read(&path).unwrap()[..bytes.len()], bytes[..]);

        let ids: Vec<_> = FileEventLog::read_records(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_damaged_last_record_still_advances_ids() {
        let dir = TempDir::new().unwrap();
        let mut events = log(&dir);
        events.append("a", &json!(1)).unwrap();
        events.append("b", &json!(2)).unwrap();
        drop(events);

        let path = dir.path().join(EVENT_LOG_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;
        fs::write(&path, &bytes).unwrap();

        let mut events = log(&dir);
        assert_eq!(events.append("c", &json!(3)).unwrap(), 3);
        let kinds: Vec<_> = FileEventLog::read_records(&path)
            .unwrap()
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(kinds, vec!["a", "c"]);
    }

    #[test]
    fn test_missing_key_is_swallowed_by_log() {
        let dir = TempDir::new().unwrap();
        let mut events = FileEventLog::new(dir.path(), cipher(), None);
        assert!(matches!(
            events.append("a", &json!(1)),
            Err(RepositoryError::MissingKey)
        ));
        events.log("a", &json!(1));
        assert!(!events.path().exists());
    }
}
