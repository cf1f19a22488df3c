//! # Per-run monitor loops: health probe and resource sampler.
//!
//! Both loops run iff the target is running: the supervisor spawns them
//! right after a successful spawn with children of the run token, and the
//! token is cancelled on every exit path.
//!
//! - The probe loop re-reads port and cadence from the config each tick, so
//!   `update_config` changes take effect on the next cycle without a restart.
//! - The sampler loop writes into the shared memory cell; the supervisor
//!   resets the cell to `None` when the child exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::state::State;
use crate::probe::HealthProbe;
use crate::sampler::{sample_memory, SAMPLE_INTERVAL};

/// Probes the health endpoint every `healthCheckIntervalMs`.
pub(crate) fn spawn_probe(
    state: Arc<Mutex<State>>,
    probe: Arc<HealthProbe>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (port, interval) = {
                let state = state.lock().await;
                (
                    state.config.health_check_port,
                    Duration::from_millis(state.config.health_check_interval_ms),
                )
            };
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = token.cancelled() => break,
            }
            probe.check(port).await;
        }
    })
}

/// Samples the child's resident memory every 5 s.
pub(crate) fn spawn_sampler(
    pid: u32,
    memory: Arc<RwLock<Option<u64>>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(SAMPLE_INTERVAL) => {}
                _ = token.cancelled() => break,
            }
            let reading = sample_memory(pid).await;
            // The run may have ended while the sample was in flight; the
            // exit handler's `None` must not be overwritten.
            if token.is_cancelled() {
                break;
            }
            *memory.write().await = reading;
        }
    })
}
