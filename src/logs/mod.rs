//! Log aggregation: entry model, classifier, bounded ring, file tailer.
//!
//! Two producers feed one bounded ring:
//! - **stream capture** — the supervisor pushes raw stdout/stderr chunks
//!   through [`LogBuffer::push_chunk`];
//! - **file tailer** — [`FileTailer`] polls the watched files and pushes only
//!   newly appended bytes.
//!
//! Every accepted line is classified by the substring tables in
//! `classify.rs` and published on the bus as a `log` event. The shell
//! queries the ring through the supervisor's `logs(limit, category)`
//! operation.

pub(crate) mod buffer;
pub(crate) mod classify;
mod entry;
pub(crate) mod tailer;

pub use buffer::{LogBuffer, LOG_CAPACITY};
pub use entry::{LogCategory, LogEntry, LogLevel, LogSource};
pub use tailer::{default_watched_files, FileTailer, WatchedFile};
