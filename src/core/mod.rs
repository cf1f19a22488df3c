//! Supervision core: the state machine and its run lifecycle.
//!
//! The only public API re-exported from here is [`Supervisor`] together with
//! the status model. Everything else is an internal building block the
//! supervisor wires together.
//!
//! ## Files & responsibilities
//! - **supervisor.rs**: public facade; owns the runtime (Bus, SubscriberSet,
//!   LogBuffer, HealthProbe, memory cell, Store) and the state mutex; start/
//!   stop/restart/build-and-run contracts; the exit-handling sequence and
//!   backoff scheduling.
//! - **state.rs**: the single-owner mutable state (`status`, `pid`,
//!   generation counter, backoff position, crash window and history, run
//!   tokens).
//! - **runner.rs**: per-run plumbing — stream reader tasks and the exit
//!   watcher that owns the child until the run ends.
//! - **monitor.rs**: health probe and memory sampler loops, children of the
//!   run token.
//! - **status.rs**: `Status` and the `StatusInfo` snapshot.
//! - **shutdown.rs**: cross-platform OS signal wait used by the CLI.
//!
//! ## Event data-plane (who publishes & who consumes)
//!
//! Producers (publish to Bus):
//! - **Supervisor** → `status-changed{snapshot}`, `crash{entry}`,
//!   `max-restarts{snapshot}`
//! - **LogBuffer** → `log{entry}` (fed by stream readers and the tailer)
//!
//! Consumers (subscribe to Bus):
//! - **Supervisor fan-out listener** → `SubscriberSet` (per-subscriber
//!   bounded queues)
//! - Raw receivers from `Supervisor::subscribe()`
//!
//! ## Run timeline
//! ```text
//! start() ─► spawn ─► status-changed(running)
//!    │
//!    ├─ monitors: probe each interval, sampler each 5s   (run token)
//!    └─ watcher: child exits ─► handle_exit()
//!         ├─ requested/clean ─► status-changed(stopped)
//!         └─ crash ─► crash{entry} ─► status-changed(crashed)
//!              ├─ !autoRestart ─► (crashed)
//!              ├─ window full ─► status-changed(max_restarts) ─► max-restarts
//!              └─ status-changed(restarting) ─► sleep(backoff) ─► start()
//! ```
//!
//! ## Shutdown timeline
//! ```text
//! stop() ─► disarm backoff ─► status-changed(stopped) ─► cancel run token
//!   ─► watcher: SIGTERM ─► wait ≤ 5s ─► force kill ─► join watcher ─► return
//! ```

mod monitor;
mod runner;
pub(crate) mod shutdown;
mod state;
mod status;
mod supervisor;

pub use shutdown::wait_for_shutdown_signal;
pub use status::{Status, StatusInfo};
pub use supervisor::Supervisor;
