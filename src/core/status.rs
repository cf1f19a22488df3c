//! # Supervisor status model.
//!
//! [`Status`] is the state machine's state set; [`StatusInfo`] is the owned
//! snapshot returned by every public operation and carried on
//! `status-changed` events. Snapshots are copies — holding one never blocks
//! the supervisor.

use serde::{Deserialize, Serialize};

use crate::config::Mode;

/// State of the supervision state machine.
///
/// `Stopped` and `MaxRestarts` are terminal for the session: only an explicit
/// `start()` / `restart()` leaves them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Fresh supervisor, nothing launched yet.
    Idle,
    /// Child is spawned and not yet observed as exited.
    Running,
    /// Child exited abnormally; auto-restart did not (or may not) fire.
    Crashed,
    /// Backoff timer armed; the next spawn is scheduled.
    Restarting,
    /// Orderly shutdown, by request or clean child exit.
    Stopped,
    /// Crash-rate limit exhausted; waiting for a manual `restart()`.
    MaxRestarts,
}

impl Status {
    /// Stable snake_case name, matching the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Crashed => "crashed",
            Status::Restarting => "restarting",
            Status::Stopped => "stopped",
            Status::MaxRestarts => "max_restarts",
        }
    }
}

/// Owned snapshot of the supervisor's observable state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    /// Current state machine state.
    pub status: Status,
    /// Mode the next (or current) run uses.
    pub mode: Mode,
    /// Path the mode resolves to (dev tree or packaged binary).
    pub exe_path: String,
    /// Child PID while spawned and not yet observed as exited.
    pub pid: Option<u32>,
    /// `now - startTime` while running, `0` otherwise.
    pub uptime_ms: u64,
    /// Crashes recorded since the history was last cleared.
    pub total_crashes: u64,
    /// Crashes inside the current rolling window.
    pub recent_crashes: u32,
    /// Next scheduled restart delay, in milliseconds.
    pub backoff_ms: u64,
    /// Epoch ms of the last probe attempt, if any ran yet.
    pub last_health_check: Option<u64>,
    /// Whether the last probe returned `200 OK`.
    pub health_check_ok: bool,
    /// Child resident memory in bytes, when the sampler has a reading.
    pub memory: Option<u64>,
    /// CPU percentage; not measured, always `None`.
    pub cpu: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_encoding_is_snake_case() {
        assert_eq!(
            serde_json::to_value(Status::MaxRestarts).unwrap(),
            serde_json::json!("max_restarts")
        );
        assert_eq!(Status::MaxRestarts.as_str(), "max_restarts");
        assert_eq!(
            serde_json::to_value(Status::Running).unwrap(),
            serde_json::json!("running")
        );
    }
}
