use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ChatResult;
use crate::models::LoggingConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
}

/// One line of the request log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub model: String,
    pub message: String,
    pub outcome: Outcome,
    pub detail: String,
}

impl LogEntry {
    pub fn from_result(
        request_id: Option<String>,
        model: &str,
        message: &str,
        result: &ChatResult,
    ) -> Self {
        let (outcome, detail) = match result {
            Ok(text) => (Outcome::Success, text.clone()),
            Err(e) => (Outcome::Error, e.to_string()),
        };
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            request_id,
            model: model.to_string(),
            message: message.to_string(),
            outcome,
            detail,
        }
    }
}

/// Append-only JSON-lines sink with size-based rotation.
///
/// Every append and rotation happens under one lock, so concurrent writers
/// never produce interleaved lines. `path.1` is the newest backup and
/// `path.<max_backups>` the oldest.
pub struct RequestLog {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    file: Mutex<Option<File>>,
}

impl RequestLog {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_backups: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            max_backups,
            file: Mutex::new(None),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(
            config.request_log_path(),
            config.request_log_max_bytes,
            config.request_log_backups,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LogEntry) -> io::Result<()> {
        let mut line = serde_json::to_string(entry).map_err(io::Error::other)?;
        line.push('\n');

        let mut guard = self.file.lock();
        if self.needs_rotation(line.len() as u64)? {
            *guard = None;
            self.rotate()?;
        }
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        let file = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("request log is not open"))?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Current log contents, or `None` when nothing has been written yet.
    pub fn read_all(&self) -> io::Result<Option<String>> {
        let _guard = self.file.lock();
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn needs_rotation(&self, incoming: u64) -> io::Result<bool> {
        if self.max_bytes == 0 {
            return Ok(false);
        }
        let current = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(current > 0 && current + incoming > self.max_bytes)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self) -> io::Result<()> {
        if self.max_backups == 0 {
            File::create(&self.path)?;
            return Ok(());
        }
        for index in (1..self.max_backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;
        tracing::debug!("Rotated request log {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use std::sync::Arc;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!(".chat-relay-request-log-{}", uuid::Uuid::new_v4()))
            .join("requests.log")
    }

    fn entry(model: &str, detail: &str) -> LogEntry {
        LogEntry::from_result(None, model, "hello", &Ok(detail.to_string()))
    }

    #[test]
    fn read_before_first_write_is_none() {
        let log = RequestLog::new(temp_log_path(), 0, 0);
        assert_eq!(log.read_all().unwrap(), None);
    }

    #[test]
    fn append_writes_one_json_line_per_entry() {
        let path = temp_log_path();
        let log = RequestLog::new(&path, 0, 0);
        log.append(&entry("model-a", "hi")).unwrap();
        log.append(&entry("model-b", "multi\nline")).unwrap();

        let content = log.read_all().unwrap().expect("log exists");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.model, "model-b");
        assert_eq!(second.detail, "multi\nline");
        assert_eq!(second.outcome, Outcome::Success);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn error_results_are_recorded_with_description() {
        let result: ChatResult = Err(RelayError::Transport("upstream request timed out".into()));
        let entry = LogEntry::from_result(Some("req-9".into()), "m", "ping", &result);
        assert_eq!(entry.outcome, Outcome::Error);
        assert_eq!(entry.detail, "upstream request timed out");
        assert_eq!(entry.request_id.as_deref(), Some("req-9"));
    }

    #[test]
    fn rotation_keeps_at_most_configured_backups() {
        let path = temp_log_path();
        let line_len = serde_json::to_string(&entry("m", "x")).unwrap().len() as u64 + 1;
        // Room for exactly two lines per file.
        let log = RequestLog::new(&path, line_len * 2, 2);

        for _ in 0..9 {
            log.append(&entry("m", "x")).unwrap();
        }

        assert!(path.exists());
        assert!(log.backup_path(1).exists());
        assert!(log.backup_path(2).exists());
        assert!(!log.backup_path(3).exists());
        let current = fs::read_to_string(&path).unwrap();
        assert_eq!(current.lines().count(), 1);
        let newest_backup = fs::read_to_string(log.backup_path(1)).unwrap();
        assert_eq!(newest_backup.lines().count(), 2);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rotation_without_backups_truncates() {
        let path = temp_log_path();
        let line_len = serde_json::to_string(&entry("m", "x")).unwrap().len() as u64 + 1;
        let log = RequestLog::new(&path, line_len, 0);

        log.append(&entry("m", "x")).unwrap();
        log.append(&entry("m", "x")).unwrap();

        let content = log.read_all().unwrap().unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(!log.backup_path(1).exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn concurrent_appends_never_interleave() {
        let path = temp_log_path();
        let log = Arc::new(RequestLog::new(&path, 0, 0));
        let long_detail = "y".repeat(8192);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let log = log.clone();
                let detail = long_detail.clone();
                std::thread::spawn(move || {
                    for j in 0..8 {
                        log.append(&entry(&format!("model-{}-{}", i, j), &detail))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = log.read_all().unwrap().unwrap();
        let parsed: Vec<LogEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).expect("well-formed line"))
            .collect();
        assert_eq!(parsed.len(), 128);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
