//! Run log: an explicitly owned, line-oriented log sink.
//!
//! A [`RunLog`] is created by the caller and handed to the batch processor.
//! Every entry is appended to the log file (if any), optionally echoed to
//! stderr, and broadcast to subscribers. The file is flushed on drop.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::error::{PipelineError, PipelineResult};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Level name written to the log file.
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    fn console_prefix(self) -> &'static str {
        match self {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// When the entry was recorded
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// `2024-05-01 12:00:00,123 - INFO - message`
    pub fn to_line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level.label(),
            self.message
        )
    }
}

/// Owned log sink for one run.
pub struct RunLog {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    echo: bool,
    sender: broadcast::Sender<LogEntry>,
}

impl RunLog {
    /// Open (or create) a log file in append mode.
    ///
    /// Missing parent directories are created.
    pub fn open(path: impl AsRef<Path>, echo: bool) -> PipelineResult<Self> {
        let path = path.as_ref().to_path_buf();
        let sink_error = |source: std::io::Error| PipelineError::LogSink {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(sink_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(sink_error)?;

        let mut log = Self::detached(echo);
        log.file = Some(Mutex::new(BufWriter::new(file)));
        log.path = Some(path);
        Ok(log)
    }

    /// Log that only echoes to stderr.
    pub fn console() -> Self {
        Self::detached(true)
    }

    /// Log with no file and no echo; entries still reach subscribers.
    pub fn silent() -> Self {
        Self::detached(false)
    }

    fn detached(echo: bool) -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            file: None,
            path: None,
            echo,
            sender,
        }
    }

    /// Path of the backing log file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an entry.
    pub fn log(&self, entry: LogEntry) {
        if let Some(file) = &self.file {
            if let Ok(mut writer) = file.lock() {
                // A failing log write must never end the run.
                let _ = writeln!(writer, "{}", entry.to_line());
            }
        }

        if self.echo {
            eprintln!("{} {}", entry.level.console_prefix(), entry.message);
        }

        // Ignore if no receivers
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for every entry logged from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.log(LogEntry::warning(msg));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.log(LogEntry::error(msg));
    }

    /// Flush buffered lines to disk.
    pub fn flush(&self) -> std::io::Result<()> {
        match &self.file {
            Some(file) => match file.lock() {
                Ok(mut writer) => writer.flush(),
                Err(_) => Ok(()),
            },
            None => Ok(()),
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl std::fmt::Debug for RunLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLog")
            .field("path", &self.path)
            .field("echo", &self.echo)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let line = LogEntry::error("Row 3 failed").to_line();
        assert!(line.ends_with(" - ERROR - Row 3 failed"));
        // "YYYY-MM-DD HH:MM:SS,mmm"
        assert_eq!(line.find(" - "), Some(23));
    }

    #[test]
    fn test_subscribers_receive_entries() {
        let log = RunLog::silent();
        let mut rx = log.subscribe();

        log.info("Starting to process 2 tasks");
        log.warning("careful");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(first.message, "Starting to process 2 tasks");
        assert_eq!(rx.try_recv().unwrap().level, LogLevel::Warning);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_file_sink_appends_and_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("processing.log");

        {
            let log = RunLog::open(&path, false).unwrap();
            assert_eq!(log.path(), Some(path.as_path()));
            log.info("first");
        }
        {
            let log = RunLog::open(&path, false).unwrap();
            log.error("second");
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO - first"));
        assert!(lines[1].ends_with("ERROR - second"));
    }
}
