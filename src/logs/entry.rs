//! # Log entry model.
//!
//! [`LogEntry`] is the unit held by the ring buffer and published on the bus.
//! Entries come from three sources: the child's stdout and stderr streams and
//! the tailed auxiliary files. Level and category are assigned by the
//! classifier tables in `classify.rs` at push time.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Severity assigned to a log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

/// Subsystem a log line is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Console,
    Network,
    Renderer,
    Security,
    System,
    Ipc,
    Performance,
}

/// Where a log line entered the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    Stdout,
    Stderr,
    File,
}

/// One classified log line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock timestamp, epoch milliseconds.
    pub timestamp: u64,
    /// Severity from the classifier.
    pub level: LogLevel,
    /// Category from the classifier (per-line override or source default).
    pub category: LogCategory,
    /// The line itself, without the trailing newline.
    pub message: String,
    /// Stream or file the line came from.
    pub source: LogSource,
}

impl LogEntry {
    /// Creates an entry stamped with the current wall-clock time.
    pub fn now(level: LogLevel, category: LogCategory, message: String, source: LogSource) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            timestamp,
            level,
            category,
            message,
            source,
        }
    }
}
