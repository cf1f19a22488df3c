//! # HTTP health prober.
//!
//! While the target runs, the supervisor probes
//! `http://localhost:<healthCheckPort>/status` every
//! `healthCheckIntervalMs`. A `200 OK` marks the target healthy; any other
//! status or any transport error marks it unhealthy. Probe results are
//! diagnostic only — crashes, not failed probes, drive the state machine.
//!
//! One [`reqwest::Client`] is built per supervisor with the 5 s per-request
//! timeout and reused across probes.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::debug;

/// Per-request probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of the most recent probe.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProbeState {
    /// Epoch ms of the last probe attempt.
    pub last_check: Option<u64>,
    /// Whether the last probe returned `200 OK`.
    pub ok: bool,
}

/// Periodic HTTP GET against the target's health endpoint.
pub struct HealthProbe {
    client: reqwest::Client,
    state: Arc<RwLock<ProbeState>>,
}

impl HealthProbe {
    /// Builds the probe with its dedicated client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            state: Arc::new(RwLock::new(ProbeState::default())),
        }
    }

    /// Shared handle to the probe result, read by status snapshots.
    pub fn state(&self) -> Arc<RwLock<ProbeState>> {
        Arc::clone(&self.state)
    }

    /// Runs one probe against the given port and records the outcome.
    pub async fn check(&self, port: u16) {
        let url = format!("http://localhost:{port}/status");
        let ok = match self.client.get(&url).send().await {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(error = %e, "health probe failed");
                false
            }
        };

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut state = self.state.write().await;
        state.last_check = Some(now);
        state.ok = ok;
    }
}

impl Default for HealthProbe {
    fn default() -> Self {
        Self::new()
    }
}
