//! # hekavisor
//!
//! **Hekavisor** is a process supervisor for one local desktop target.
//!
//! It launches the target (dev command or packaged binary), watches for
//! exits, restarts after crashes under an exponential backoff ladder and a
//! rolling crash-rate limit, probes an HTTP health endpoint, samples resident
//! memory, tails auxiliary log files, and persists configuration and crash
//! history as JSON.
//!
//! ## Features
//!
//! | Area              | Description                                                          | Key types / traits                  |
//! |-------------------|----------------------------------------------------------------------|-------------------------------------|
//! | **Supervision**   | Lifecycle state machine with rate-limited, backed-off restarts.      | [`Supervisor`], [`Status`]          |
//! | **Events**        | Sequenced stream: status changes, crashes, log lines, rate-limit.    | [`Event`], [`EventKind`], [`Subscribe`] |
//! | **Logs**          | Bounded classified ring fed by streams and a polling file tailer.    | [`LogBuffer`], [`LogEntry`], [`FileTailer`] |
//! | **Policies**      | Backoff ladder with stability rewind; rolling crash window.          | [`BackoffPolicy`], [`CrashWindow`]  |
//! | **Persistence**   | Config and crash history under `~/.claude-launcher/`.                | [`Store`], [`WatchdogConfig`], [`CrashEntry`] |
//! | **Errors**        | Typed internal errors; the facade never throws past its caller.      | [`WatchdogError`]                   |
//!
//! ```no_run
//! use std::sync::Arc;
//! use hekavisor::{Supervisor, TraceWriter, wait_for_shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let supervisor = Supervisor::open(vec![Arc::new(TraceWriter)]).await?;
//!
//!     let status = supervisor.start(None).await;
//!     println!("started: {:?}", status.status);
//!
//!     wait_for_shutdown_signal().await?;
//!     supervisor.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod core;
mod error;
mod events;
mod logs;
mod policies;
mod probe;
mod process;
mod sampler;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use config::{ConfigPatch, Mode, WatchdogConfig};
pub use core::{wait_for_shutdown_signal, Status, StatusInfo, Supervisor};
pub use error::WatchdogError;
pub use events::{Bus, Event, EventKind};
pub use logs::{
    default_watched_files, FileTailer, LogBuffer, LogCategory, LogEntry, LogLevel, LogSource,
    WatchedFile, LOG_CAPACITY,
};
pub use policies::{BackoffPolicy, CrashWindow};
pub use probe::{HealthProbe, ProbeState, PROBE_TIMEOUT};
pub use process::ENV_API_PORT;
pub use sampler::{sample_memory, SAMPLE_INTERVAL};
pub use store::{CrashEntry, Store};
pub use subscribers::{Subscribe, SubscriberSet, TraceWriter};
