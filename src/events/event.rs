//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum mirrors the four-kind stream the shell consumes:
//!
//! - **`StatusChanged`** — the state machine moved; carries a [`StatusInfo`]
//!   snapshot taken at transition time.
//! - **`Crash`** — a child exit was recorded as a crash; carries the
//!   [`CrashEntry`] that was appended to the history.
//! - **`Log`** — one classified line entered the ring buffer; carries the
//!   [`LogEntry`].
//! - **`MaxRestarts`** — the rolling crash-rate limit was exhausted.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. For a given run, `StatusChanged(running)` precedes the
//! run's `Crash`, which precedes the following `StatusChanged(crashed)`;
//! `seq` lets consumers re-establish that order after async delivery.
//!
//! ## Example
//! ```
//! use hekavisor::{Event, EventKind};
//!
//! let a = Event::now(EventKind::MaxRestarts);
//! let b = Event::now(EventKind::MaxRestarts);
//! assert!(b.seq > a.seq);
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::StatusInfo;
use crate::logs::LogEntry;
use crate::store::CrashEntry;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The state machine transitioned.
    StatusChanged,
    /// A child exit was recorded as a crash.
    Crash,
    /// A line was appended to the log ring.
    Log,
    /// The crash-rate limit was exhausted; supervision halted.
    MaxRestarts,
}

impl EventKind {
    /// Stable kebab-case wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StatusChanged => "status-changed",
            EventKind::Crash => "crash",
            EventKind::Log => "log",
            EventKind::MaxRestarts => "max-restarts",
        }
    }
}

/// Supervisor event with its payload.
///
/// Payload fields are optional and kind-dependent; builder methods attach
/// them at publish sites.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for display only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Status snapshot, populated on `StatusChanged` (and `MaxRestarts`).
    pub status: Option<StatusInfo>,
    /// Crash record, populated on `Crash`.
    pub crash: Option<CrashEntry>,
    /// Log line, populated on `Log`.
    pub log: Option<LogEntry>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            status: None,
            crash: None,
            log: None,
        }
    }

    /// Attaches a status snapshot.
    pub fn with_status(mut self, status: StatusInfo) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a crash record.
    pub fn with_crash(mut self, crash: CrashEntry) -> Self {
        self.crash = Some(crash);
        self
    }

    /// Attaches a log line.
    pub fn with_log(mut self, log: LogEntry) -> Self {
        self.log = Some(log);
        self
    }
}
