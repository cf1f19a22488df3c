//! # Bounded in-memory log ring.
//!
//! [`LogBuffer`] holds the most recent classified lines (FIFO, capacity
//! 5,000): on overflow the oldest entry drops first. Pushes come from the
//! child's stream readers and from the file tailer; reads come from the
//! query API. Every accepted line is also published on the bus as a `log`
//! event.
//!
//! The ring is internally serialized with a `std::sync::Mutex` — pushers and
//! readers contend only for the short push/copy critical sections.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::events::{Bus, Event, EventKind};

use super::classify::classify;
use super::entry::{LogCategory, LogEntry, LogSource};

/// Maximum entries retained by the ring.
pub const LOG_CAPACITY: usize = 5_000;

/// Bounded, internally synchronized ring of classified log lines.
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    bus: Bus,
    capacity: usize,
}

impl LogBuffer {
    /// Creates a ring with the standard capacity.
    pub fn new(bus: Bus) -> Self {
        Self::with_capacity(LOG_CAPACITY, bus)
    }

    /// Creates a ring with an explicit capacity (tests).
    pub fn with_capacity(capacity: usize, bus: Bus) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(LOG_CAPACITY))),
            bus,
            capacity,
        }
    }

    /// Splits a raw chunk on `\n`, drops empty lines, classifies and appends
    /// each, publishing one `log` event per accepted line.
    ///
    /// `default_category` is used when no per-line override matches
    /// (`console` for the child's streams).
    pub fn push_chunk(&self, chunk: &str, source: LogSource, default_category: LogCategory) {
        for line in chunk.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            self.push_line(line, source, default_category);
        }
    }

    /// Classifies and appends one line.
    pub fn push_line(&self, line: &str, source: LogSource, default_category: LogCategory) {
        let (level, category) = classify(line, source, default_category);
        let entry = LogEntry::now(level, category, line.to_string(), source);

        {
            let mut entries = self.entries.lock().expect("log ring poisoned");
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }

        self.bus.publish(Event::now(EventKind::Log).with_log(entry));
    }

    /// Returns the tail of the ring: filtered by category, then truncated to
    /// the last `limit` entries.
    pub fn query(&self, limit: Option<usize>, category: Option<LogCategory>) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("log ring poisoned");
        let filtered: Vec<LogEntry> = entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .cloned()
            .collect();
        match limit {
            Some(n) if n < filtered.len() => filtered[filtered.len() - n..].to_vec(),
            _ => filtered,
        }
    }

    /// Empties the ring.
    pub fn clear(&self) {
        self.entries.lock().expect("log ring poisoned").clear();
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("log ring poisoned").len()
    }

    /// True when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
