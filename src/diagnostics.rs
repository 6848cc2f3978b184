//! Diagnostic log: a bounded, in-memory ring buffer of structured entries.
//!
//! Every entry is mirrored to the [`log`] facade when it is appended
//! (`ERROR` → `error!`, `WARN` → `warn!`, `DEBUG` → `debug!`, everything else
//! → `info!`), so a console sink set up in `main` sees the same stream. The
//! buffer itself exists so the whole session can be inspected or exported
//! after the fact:
//!
//! ```text
//! append ──► VecDeque (cap 1000, oldest evicted) ──► entries / recent / export
//!   │
//!   └──► log::{debug,info,warn,error}!
//! ```
//!
//! Nothing in the crate reads the buffer to make decisions.
//!
//! A process-wide instance lives behind [`record`], [`debug`], [`info`],
//! [`warn`], [`error`] and [`with_global`]. Tests use their own
//! [`DiagnosticLog`] values.

use crate::export::{Download, file_name_for_logs};
use crate::fault::Fault;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, PoisonError};

/// Maximum entries kept; appending beyond it evicts the oldest.
pub const MAX_ENTRIES: usize = 1000;

/// Default count for [`DiagnosticLog::recent`].
pub const DEFAULT_RECENT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    fn facade_level(self) -> log::Level {
        match self {
            Level::Error => log::Level::Error,
            Level::Warn => log::Level::Warn,
            Level::Debug => log::Level::Debug,
            Level::Info => log::Level::Info,
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub category: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }

    /// A buffer holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, evicting the oldest one when full, and mirror it to
    /// the console sink.
    pub fn log(
        &mut self,
        level: Level,
        category: &str,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            category: category.to_string(),
            message: message.into(),
            data,
        };
        mirror(&entry);

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn debug(&mut self, category: &str, message: impl Into<String>) {
        self.log(Level::Debug, category, message, None);
    }

    pub fn info(&mut self, category: &str, message: impl Into<String>) {
        self.log(Level::Info, category, message, None);
    }

    pub fn warn(&mut self, category: &str, message: impl Into<String>) {
        self.log(Level::Warn, category, message, None);
    }

    pub fn error(&mut self, category: &str, message: impl Into<String>) {
        self.log(Level::Error, category, message, None);
    }

    /// Entries matching both filters, oldest first. `None` matches anything.
    pub fn entries(&self, level: Option<Level>, category: Option<&str>) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| level.is_none_or(|l| e.level == l))
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect()
    }

    /// What the log listing shows: the filtered entries when a filter is
    /// given, otherwise the last [`DEFAULT_RECENT`].
    pub fn view(&self, level: Option<Level>, category: Option<&str>) -> Vec<LogEntry> {
        if level.is_none() && category.is_none() {
            self.recent(DEFAULT_RECENT)
        } else {
            self.entries(level, category)
        }
    }

    /// The last `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Distinct categories present in the buffer, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Drop every entry. The clear itself is logged, so the buffer is left
    /// holding exactly that one entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.info("Logger", "Logs cleared");
    }

    /// The full buffer as a pretty-printed JSON array.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// Export the buffer and hand it to `sink` as
    /// `photo-frame-logs-{now_millis}.json`.
    pub fn download(&self, sink: &dyn Download, now_millis: i64) -> Result<PathBuf, Fault> {
        let json = self.export_json().map_err(Fault::error)?;
        sink.download(&file_name_for_logs(now_millis), json.as_bytes())
    }
}

fn mirror(entry: &LogEntry) {
    let prefix = format!(
        "[{}] [{}] [{}]",
        entry.timestamp.to_rfc3339(),
        entry.level.as_str(),
        entry.category
    );
    match &entry.data {
        Some(data) => log::log!(
            target: "photo_frame",
            entry.level.facade_level(),
            "{prefix} {} {data}",
            entry.message
        ),
        None => log::log!(
            target: "photo_frame",
            entry.level.facade_level(),
            "{prefix} {}",
            entry.message
        ),
    }
}

// =============================================================================
// Process-wide instance
// =============================================================================

static GLOBAL: LazyLock<Mutex<DiagnosticLog>> = LazyLock::new(|| Mutex::new(DiagnosticLog::new()));

/// Run `f` against the process-wide log.
pub fn with_global<R>(f: impl FnOnce(&mut DiagnosticLog) -> R) -> R {
    let mut guard = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

pub fn record(
    level: Level,
    category: &str,
    message: impl Into<String>,
    data: Option<serde_json::Value>,
) {
    with_global(|log| log.log(level, category, message, data));
}

pub fn debug(category: &str, message: impl Into<String>) {
    record(Level::Debug, category, message, None);
}

pub fn info(category: &str, message: impl Into<String>) {
    record(Level::Info, category, message, None);
}

pub fn warn(category: &str, message: impl Into<String>) {
    record(Level::Warn, category, message, None);
}

pub fn error(category: &str, message: impl Into<String>) {
    record(Level::Error, category, message, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::testing::RecordingDownload;
    use serde_json::json;

    #[test]
    fn never_exceeds_capacity() {
        let mut log = DiagnosticLog::new();
        for i in 0..(MAX_ENTRIES + 250) {
            log.info("Test", format!("entry {i}"));
        }
        assert_eq!(log.len(), MAX_ENTRIES);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut log = DiagnosticLog::with_capacity(3);
        for i in 0..5 {
            log.info("Test", format!("entry {i}"));
        }
        let messages: Vec<String> = log.entries(None, None).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn filters_by_level_and_category() {
        let mut log = DiagnosticLog::new();
        log.info("Upload", "reading file");
        log.error("Export", "gallery failed");
        log.info("Export", "download done");
        log.error("Upload", "metadata failed");

        assert_eq!(log.entries(Some(Level::Error), None).len(), 2);
        assert_eq!(log.entries(None, Some("Export")).len(), 2);

        let both = log.entries(Some(Level::Error), Some("Export"));
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].message, "gallery failed");
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut log = DiagnosticLog::new();
        for i in 0..10 {
            log.debug("Test", format!("{i}"));
        }
        let tail: Vec<String> = log.recent(3).into_iter().map(|e| e.message).collect();
        assert_eq!(tail, vec!["7", "8", "9"]);
        assert_eq!(log.recent(100).len(), 10);
    }

    #[test]
    fn view_defaults_to_recent_and_applies_filters() {
        let mut log = DiagnosticLog::new();
        for i in 0..60 {
            log.debug("Upload", format!("step {i}"));
        }
        log.warn("Export", "slow image");
        log.error("Export", "tier failed");

        let unfiltered = log.view(None, None);
        assert_eq!(unfiltered.len(), DEFAULT_RECENT);
        assert_eq!(unfiltered.last().unwrap().message, "tier failed");

        let warnings = log.view(Some("warning".parse().unwrap()), None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "slow image");

        assert_eq!(log.view(None, Some("Export")).len(), 2);
        assert_eq!(log.view(Some(Level::Debug), Some("Upload")).len(), 60);
        assert!(log.view(Some(Level::Info), Some("Export")).is_empty());
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let mut log = DiagnosticLog::new();
        log.info("Export", "a");
        log.info("Upload", "b");
        log.info("Export", "c");
        assert_eq!(log.categories(), vec!["Export", "Upload"]);
    }

    #[test]
    fn clear_leaves_only_its_own_entry() {
        let mut log = DiagnosticLog::new();
        log.info("Test", "one");
        log.warn("Test", "two");
        log.clear();

        let entries = log.entries(None, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, "Logger");
        assert_eq!(entries[0].level, Level::Info);
    }

    #[test]
    fn export_is_pretty_json_array() {
        let mut log = DiagnosticLog::new();
        log.log(Level::Warn, "Export", "tier failed", Some(json!({"tier": "documents"})));
        log.info("Export", "saved");

        let json = log.export_json().unwrap();
        assert!(json.starts_with("[\n"));
        let parsed: Vec<LogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].level, Level::Warn);
        assert_eq!(parsed[0].data, Some(json!({"tier": "documents"})));
        assert_eq!(parsed[1].data, None);
        assert!(json.contains("\"level\": \"WARN\""));
    }

    #[test]
    fn download_uses_log_file_name() {
        let mut log = DiagnosticLog::new();
        log.info("Test", "hello");
        let sink = RecordingDownload::succeeding();

        log.download(&sink, 1_700_000_000_000).unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "photo-frame-logs-1700000000000.json");
        let parsed: Vec<LogEntry> = serde_json::from_slice(&calls[0].1).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("warn".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("ERROR".parse::<Level>().unwrap(), Level::Error);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut log = DiagnosticLog::with_capacity(0);
        log.info("Test", "a");
        log.info("Test", "b");
        assert_eq!(log.len(), 1);
    }
}
