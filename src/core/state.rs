//! # Single-owner mutable supervisor state.
//!
//! [`State`] is the one place `status`, `pid`, `started_at`, the backoff
//! ladder position, and the crash bookkeeping live. It sits behind a
//! `tokio::sync::Mutex` in the supervisor — every transition is serialized,
//! concurrent callers observe consistent snapshots, and the state machine
//! never reaches a forbidden state.
//!
//! ## Rules
//! - `pid` is non-`None` iff a child is spawned and not yet observed as exited.
//! - `run` is a generation counter: each spawn increments it, and the run's
//!   exit watcher and monitors discard their effects when a newer run has
//!   superseded them.
//! - `run_token` cancels the current run's monitors and flips its exit
//!   watcher into the termination path; `backoff_token` disarms the pending
//!   restart timer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Mode, WatchdogConfig};
use crate::core::status::Status;
use crate::policies::{BackoffPolicy, CrashWindow};
use crate::process::StderrTail;
use crate::store::CrashEntry;

/// Mutable core owned by the supervisor's state mutex.
pub(crate) struct State {
    /// Current state machine state.
    pub status: Status,
    /// Current configuration (mirrors the persisted document).
    pub config: WatchdogConfig,
    /// Effective launch mode; `start(mode)` overrides it without persisting.
    pub mode: Mode,
    /// Generation counter, incremented per spawn.
    pub run: u64,
    /// Child PID while spawned and not yet observed as exited.
    pub pid: Option<u32>,
    /// Spawn instant of the current run.
    pub started_at: Option<Instant>,
    /// Next scheduled restart delay.
    pub backoff: Duration,
    /// Rolling crash-rate window.
    pub window: CrashWindow,
    /// Crash history since the last clear (mirrors the crash file).
    pub crashes: Vec<CrashEntry>,
    /// Current run's stderr accumulator.
    pub stderr: Arc<StderrTail>,
    /// Cancels the current run's monitors and exit watcher.
    pub run_token: CancellationToken,
    /// Disarms the pending backoff timer.
    pub backoff_token: CancellationToken,
    /// Exit watcher of the current run; `stop()` joins it.
    pub watcher: Option<JoinHandle<()>>,
    /// Stream reader tasks of the current run; joined by the exit handler.
    pub readers: Vec<JoinHandle<()>>,
}

impl State {
    /// Builds the initial state from the loaded documents.
    pub fn new(config: WatchdogConfig, crashes: Vec<CrashEntry>, backoff: &BackoffPolicy) -> Self {
        Self {
            status: Status::Idle,
            mode: config.mode,
            config,
            run: 0,
            pid: None,
            started_at: None,
            backoff: backoff.first,
            window: CrashWindow::new(),
            crashes,
            stderr: Arc::new(StderrTail::new()),
            run_token: CancellationToken::new(),
            backoff_token: CancellationToken::new(),
            watcher: None,
            readers: Vec::new(),
        }
    }

    /// Width of the rolling window under the current config.
    pub fn window_width(&self) -> Duration {
        Duration::from_millis(self.config.restart_window_ms)
    }

    /// `now - startTime` while running, `0` in all other states.
    pub fn uptime_ms(&self, now: Instant) -> u64 {
        match (self.status, self.started_at) {
            (Status::Running, Some(started)) => now.duration_since(started).as_millis() as u64,
            _ => 0,
        }
    }
}
