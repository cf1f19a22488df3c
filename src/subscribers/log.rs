//! # Tracing subscriber for debugging and the CLI.
//!
//! [`TraceWriter`] renders supervisor events through `tracing` in a compact
//! human-readable form.
//!
//! ## Output shape
//! ```text
//! status changed status=running pid=Some(4242)
//! crash recorded exit_code=Some(1) uptime_ms=512
//! max restarts reached
//! ```
//!
//! Log-ring entries are re-emitted at their classified level so the target's
//! own output interleaves naturally with supervisor diagnostics.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::logs::LogLevel;

use super::Subscribe;

/// Renders supervisor events through `tracing`.
pub struct TraceWriter;

#[async_trait]
impl Subscribe for TraceWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StatusChanged => {
                if let Some(s) = &e.status {
                    info!(status = s.status.as_str(), pid = ?s.pid, "status changed");
                }
            }
            EventKind::Crash => {
                if let Some(c) = &e.crash {
                    warn!(
                        exit_code = ?c.exit_code,
                        signal = ?c.signal,
                        uptime_ms = c.uptime_ms,
                        "crash recorded"
                    );
                }
            }
            EventKind::MaxRestarts => {
                error!("max restarts reached; supervision halted");
            }
            EventKind::Log => {
                if let Some(l) = &e.log {
                    match l.level {
                        LogLevel::Error => error!(target: "hekavisor::target", "{}", l.message),
                        LogLevel::Warning => warn!(target: "hekavisor::target", "{}", l.message),
                        LogLevel::Debug => debug!(target: "hekavisor::target", "{}", l.message),
                        LogLevel::Info => info!(target: "hekavisor::target", "{}", l.message),
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "trace-writer"
    }
}
