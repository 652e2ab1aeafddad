//! Structured pipeline logs.
//!
//! Every stage reports progress through the helpers at the bottom of this
//! module. Entries go to stderr, as text or as JSON lines, and are kept
//! in a bounded in-memory history.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Mutex, RwLock};

/// Entries kept in memory before the oldest are discarded.
const MAX_HISTORY: usize = 1000;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// How entries are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-steps
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
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

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    fn render_text(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Global log sink
pub static LOG_SINK: Lazy<LogSink> = Lazy::new(LogSink::new);

/// Writes entries to stderr and remembers them.
pub struct LogSink {
    format: RwLock<LogFormat>,
    history: Mutex<Vec<LogEntry>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self {
            format: RwLock::new(LogFormat::default()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn set_format(&self, format: LogFormat) {
        if let Ok(mut current) = self.format.write() {
            *current = format;
        }
    }

    pub fn format(&self) -> LogFormat {
        self.format.read().map(|f| *f).unwrap_or_default()
    }

    pub fn log(&self, entry: LogEntry) {
        let line = match self.format() {
            LogFormat::Text => entry.render_text(),
            LogFormat::Json => {
                serde_json::to_string(&entry).unwrap_or_else(|_| entry.render_text())
            }
        };
        // A closed stderr must not abort the run.
        let _ = writeln!(std::io::stderr(), "{}", line);

        if let Ok(mut history) = self.history.lock() {
            if history.len() >= MAX_HISTORY {
                history.remove(0);
            }
            history.push(entry);
        }
    }

    /// Snapshot of the remembered entries, oldest first.
    pub fn history(&self) -> Vec<LogEntry> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_SINK.log(LogEntry::info(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_entries() {
        log_warning("history-probe-7f3a");
        let found = LOG_SINK
            .history()
            .into_iter()
            .any(|e| e.message == "history-probe-7f3a" && e.level == LogLevel::Warning);
        assert!(found);
    }

    #[test]
    fn test_json_entry_shape() {
        let entry = LogEntry::success("done").with_indent(1);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["level"], "success");
        assert_eq!(value["indent"], 1);
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(LogEntry::info("Read 3 rows").with_indent(1).render_text(), "       Read 3 rows");
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
