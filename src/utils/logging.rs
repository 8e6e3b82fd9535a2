//! Diagnostic logging setup and the instruction log
//!
//! Diagnostics go to stderr through `tracing` so stdout carries nothing but
//! instructions. Every emitted instruction is also appended to a JSON-lines
//! file named after the session start.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install the global stderr subscriber
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(default_level: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
}

/// File name for a session that started at `started` (since the epoch)
pub fn instruction_log_name(started: Duration) -> String {
    let stamp = chrono::DateTime::<chrono::Utc>::from_timestamp(started.as_secs() as i64, 0)
        .map(|time| time.format("%Y%m%d-%H%M%S").to_string())
        .unwrap_or_else(|| started.as_secs().to_string());
    format!("navigation-{}.jsonl", stamp)
}

/// Append-only JSON-lines record of emitted instructions
pub struct InstructionLog {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl InstructionLog {
    /// Create the log directory if needed and open a fresh log file in it
    pub fn create(dir: &Path, started: Duration) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(instruction_log_name(started));
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Write one record as a single line and flush it
    pub fn append<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Record {
        sequence: u64,
        bearing_deg: f64,
    }

    #[test]
    fn test_log_name_from_start_time() {
        // 2023-11-14T22:13:20Z
        let name = instruction_log_name(Duration::from_secs(1_700_000_000));
        assert_eq!(name, "navigation-20231114-221320.jsonl");
    }

    #[test]
    fn test_append_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("log");

        let mut log = InstructionLog::create(&log_dir, Duration::from_secs(1_700_000_000)).unwrap();
        log.append(&Record {
            sequence: 1,
            bearing_deg: 90.0,
        })
        .unwrap();
        log.append(&Record {
            sequence: 2,
            bearing_deg: 45.5,
        })
        .unwrap();
        assert_eq!(log.records(), 2);

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"sequence":1,"bearing_deg":90.0}"#);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["bearing_deg"], 45.5);
    }

    #[test]
    fn test_create_fails_under_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        assert!(InstructionLog::create(&blocker.join("log"), Duration::ZERO).is_err());
    }
}
