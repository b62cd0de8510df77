//! JSONL transcript writer for council events.
//!
//! Each [`Event`] is written as its wire JSON object plus a `timestamp`
//! field, one object per line.

use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use tribunal_application::EventLogger;
use tribunal_domain::Event;

/// JSONL event logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create event log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLogger for JsonlEventLogger {
    fn log(&self, event: &Event) {
        let Ok(Value::Object(mut record)) = serde_json::to_value(event) else {
            return;
        };
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        record.insert("timestamp".to_string(), Value::String(timestamp));

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Every logged line is on disk before the next event
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_one_event_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.events.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();

        logger.log(&Event::WorkerStart {
            worker_id: "scientist".into(),
        });
        logger.log(&Event::content("thinking"));
        logger.log(&Event::JudgeStart);
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "worker_start");
        assert_eq!(first["worker_id"], "scientist");
        assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));

        let last: Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["type"], "judge_start");
    }

    #[test]
    fn test_records_still_decode_as_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();
        logger.log(&Event::error("boom"));
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let event: Event = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(event, Event::error("boom"));
    }

    #[test]
    fn test_path_accessor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        let logger = JsonlEventLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
    }
}
