//! # Supervisor: the target lifecycle state machine.
//!
//! The [`Supervisor`] owns the runtime components (event bus, subscriber
//! fan-out, log ring, prober, sampler) and the single mutable [`State`] the
//! whole engine revolves around.
//!
//! ## Architecture
//! ```text
//! Supervisor::start()
//!       │
//!       ├──► TargetCommand::spawn (HEKABRAIN_API_PORT, piped streams)
//!       ├──► runner::spawn_readers ──► LogBuffer ──► Bus (log events)
//!       ├──► monitor::spawn_probe / spawn_sampler   (run token children)
//!       └──► watcher: runner::watch_exit ──► handle_exit()
//!                                                 │
//!             ┌───────────────────────────────────┘
//!             ├──► clean/stop-requested exit ──► stopped
//!             └──► crash: record + persist + window
//!                    ├──► autoRestart off ──► crashed
//!                    ├──► window full ──► max_restarts
//!                    └──► arm backoff timer ──► start()   (restarting)
//! ```
//!
//! ## Rules
//! - Every transition of `status`, `pid`, `started_at`, `backoff`, and the
//!   crash window happens under the state mutex.
//! - `stop()` marks the state `stopped` **before** terminating the child, so
//!   the exit watcher treats the teardown as orderly; it then joins the
//!   watcher, which is why no status/crash/log event of that run can trail
//!   the call.
//! - Stale work is discarded under the lock: a watcher from a superseded run
//!   finds `state.run` moved on, and a fired backoff timer re-verifies its
//!   token and the `restarting` state before spawning.
//! - Public operations never fail: errors become `error` log lines and
//!   status transitions.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ConfigPatch, Mode, WatchdogConfig};
use crate::core::monitor;
use crate::core::runner::{self, ExitOutcome};
use crate::core::state::State;
use crate::core::status::{Status, StatusInfo};
use crate::error::WatchdogError;
use crate::events::{Bus, Event, EventKind};
use crate::logs::{default_watched_files, FileTailer, LogBuffer, LogCategory, LogEntry, LogSource};
use crate::policies::BackoffPolicy;
use crate::probe::{HealthProbe, ProbeState};
use crate::process::{describe_exit, ChildHandle, StderrTail, TargetCommand};
use crate::store::{CrashEntry, Store};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Capacity of the event bus channel.
const BUS_CAPACITY: usize = 1024;

/// Supervises one local target: launch, monitor, restart, aggregate.
///
/// Cheap to share: the handle is a thin wrapper over the reference-counted
/// engine, and every operation takes `&self`.
pub struct Supervisor {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    store: Store,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    logs: Arc<LogBuffer>,
    probe: Arc<HealthProbe>,
    probe_state: Arc<RwLock<ProbeState>>,
    memory: Arc<RwLock<Option<u64>>>,
    backoff: BackoffPolicy,
    state: Arc<Mutex<State>>,
    /// Supervisor-lifetime token: tailer and fan-out listener.
    root_token: CancellationToken,
}

impl Supervisor {
    /// Opens the default store under the home directory and boots the engine.
    pub async fn open(subscribers: Vec<Arc<dyn Subscribe>>) -> Result<Self, WatchdogError> {
        Ok(Self::with_store(Store::open()?, subscribers).await)
    }

    /// Boots the engine over an explicit store (tests, alternate roots).
    ///
    /// Loads the persisted config and crash history, spawns the subscriber
    /// fan-out listener and the file tailer, and starts in `idle`.
    pub async fn with_store(store: Store, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(BUS_CAPACITY);
        let logs = Arc::new(LogBuffer::new(bus.clone()));
        let probe = Arc::new(HealthProbe::new());
        let probe_state = probe.state();
        let backoff = BackoffPolicy::default();

        let config = store.load_config().await;
        let crashes = store.load_crashes().await;

        let inner = Arc::new(Inner {
            store,
            bus,
            subs: Arc::new(SubscriberSet::new(subscribers)),
            logs: Arc::clone(&logs),
            probe,
            probe_state,
            memory: Arc::new(RwLock::new(None)),
            backoff,
            state: Arc::new(Mutex::new(State::new(config, crashes, &backoff))),
            root_token: CancellationToken::new(),
        });

        inner.spawn_fanout();
        FileTailer::new(default_watched_files(), logs).spawn(inner.root_token.child_token());

        Self { inner }
    }

    /// Launches the target, optionally overriding the launch mode.
    pub async fn start(&self, mode: Option<Mode>) -> StatusInfo {
        self.inner.start(mode, None).await;
        self.inner.snapshot().await
    }

    /// Stops supervision: disarms the backoff timer, terminates the child,
    /// and leaves the state machine in `stopped`. Idempotent.
    pub async fn stop(&self) -> StatusInfo {
        self.inner.stop().await;
        self.inner.snapshot().await
    }

    /// Full restart: stop, clear the crash window, rewind the backoff
    /// ladder, start. Also the way out of `max_restarts`.
    pub async fn restart(&self) -> StatusInfo {
        self.inner.restart().await;
        self.inner.snapshot().await
    }

    /// Builds the project (dev path), then starts in production mode on a
    /// zero exit. May be long; build output streams through the log ring.
    pub async fn build_and_run(&self) -> StatusInfo {
        self.inner.build_and_run().await;
        self.inner.snapshot().await
    }

    /// Non-blocking consistent snapshot of the observable state.
    pub async fn status(&self) -> StatusInfo {
        self.inner.snapshot().await
    }

    /// Crash history since the last clear, chronological.
    pub async fn crashes(&self) -> Vec<CrashEntry> {
        self.inner.state.lock().await.crashes.clone()
    }

    /// Empties the crash history, in memory and on disk.
    pub async fn clear_crashes(&self) {
        self.inner.clear_crashes().await;
    }

    /// Current configuration.
    pub async fn config(&self) -> WatchdogConfig {
        self.inner.state.lock().await.config.clone()
    }

    /// Merges the patch, validates, persists, and returns the result.
    ///
    /// An out-of-bounds patch is rejected wholesale: the previous config is
    /// kept and an error line is pushed.
    pub async fn update_config(&self, patch: ConfigPatch) -> WatchdogConfig {
        self.inner.update_config(patch).await
    }

    /// Tail of the log ring, filtered by category then truncated to `limit`.
    pub async fn logs(&self, limit: Option<usize>, category: Option<LogCategory>) -> Vec<LogEntry> {
        self.inner.logs.query(limit, category)
    }

    /// Empties the log ring.
    pub async fn clear_logs(&self) {
        self.inner.logs.clear();
    }

    /// Raw receiver of the event stream (tests, ad-hoc consumers).
    ///
    /// Registered [`Subscribe`] implementations are the primary consumers;
    /// this receiver observes the same events without a queue worker.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Graceful teardown: stop the target, then end the tailer and fan-out.
    pub async fn shutdown(&self) {
        self.inner.stop().await;
        self.inner.root_token.cancel();
    }
}

impl Inner {
    /// Forwards bus events to the subscriber set until the root token ends.
    fn spawn_fanout(self: &Arc<Self>) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let token = self.root_token.child_token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => subs.emit_arc(Arc::new(ev)),
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
            }
        });
    }

    /// Launches the target.
    ///
    /// `resume` is set only by the backoff timer: the token it was armed
    /// with, re-verified under the state lock. A `stop()` (or a manual
    /// `start()`) that lands between the timer firing and this lock
    /// acquisition wins — the scheduled spawn is abandoned.
    fn start<'a>(
        self: &'a Arc<Self>,
        mode_override: Option<Mode>,
        resume: Option<CancellationToken>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
        let mut state = self.state.lock().await;
        if let Some(token) = &resume {
            if token.is_cancelled() || state.status != Status::Restarting {
                return;
            }
        }
        if let Some(mode) = mode_override {
            state.mode = mode;
        }
        if state.pid.is_some() {
            warn!("start requested while the target is already running");
            return;
        }

        // Starting now supersedes any armed backoff timer.
        state.backoff_token.cancel();
        state.backoff_token = CancellationToken::new();

        let mode = state.mode;
        let command = match TargetCommand::for_mode(&state.config, mode) {
            Ok(command) => command,
            Err(e) => {
                self.error_line(&format!("cannot start in {} mode: {e}", mode.as_str()));
                self.transition(&mut state, Status::Stopped).await;
                return;
            }
        };

        let child = match command.spawn(state.config.health_check_port) {
            Ok(child) => child,
            Err(e) => {
                self.error_line(&e.to_string());
                self.transition(&mut state, Status::Stopped).await;
                return;
            }
        };

        let mut handle = ChildHandle::new(child);
        info!(command = %command.display(), pid = ?handle.pid(), "target spawned");

        state.run += 1;
        let run = state.run;
        let run_token = CancellationToken::new();
        state.run_token = run_token.clone();

        let stderr = Arc::new(StderrTail::new());
        state.stderr = Arc::clone(&stderr);
        state.pid = handle.pid();
        state.started_at = Some(Instant::now());

        state.readers = runner::spawn_readers(&mut handle, Arc::clone(&self.logs), stderr);
        self.transition(&mut state, Status::Running).await;

        monitor::spawn_probe(
            Arc::clone(&self.state),
            Arc::clone(&self.probe),
            run_token.child_token(),
        );
        if let Some(pid) = state.pid {
            monitor::spawn_sampler(pid, Arc::clone(&self.memory), run_token.child_token());
        }

        let inner = Arc::clone(self);
        state.watcher = Some(tokio::spawn(async move {
            let outcome = runner::watch_exit(handle, run_token).await;
            inner.handle_exit(run, outcome).await;
        }));
        })
    }

    async fn stop(&self) {
        let mut state = self.state.lock().await;

        // Disarm a pending restart; when invoked during `restarting` the
        // child is never spawned.
        state.backoff_token.cancel();
        state.backoff_token = CancellationToken::new();

        // `stopped` is set before termination so the exit watcher treats
        // the teardown as orderly; the event goes out after the join, with
        // the child gone from the snapshot.
        let was_stopped = state.status == Status::Stopped;
        state.status = Status::Stopped;
        state.run_token.cancel();
        let watcher = state.watcher.take();
        drop(state);

        if let Some(watcher) = watcher {
            let _ = watcher.await;
        }

        if !was_stopped {
            let mut state = self.state.lock().await;
            // A concurrent start() may have already moved on; its own event
            // stands in that case.
            if state.status == Status::Stopped {
                let snap = self.snapshot_locked(&mut state).await;
                self.bus
                    .publish(Event::now(EventKind::StatusChanged).with_status(snap));
            }
        }
    }

    async fn restart(self: &Arc<Self>) {
        self.stop().await;
        {
            let mut state = self.state.lock().await;
            state.window.clear();
            state.backoff = self.backoff.first;
        }
        self.start(None, None).await;
    }

    async fn build_and_run(self: &Arc<Self>) {
        let (command, port) = {
            let state = self.state.lock().await;
            (
                TargetCommand::for_build(&state.config),
                state.config.health_check_port,
            )
        };
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                self.error_line(&format!("cannot build: {e}"));
                return;
            }
        };

        self.stop().await;

        info!(command = %command.display(), "building target");
        let child = match command.spawn(port) {
            Ok(child) => child,
            Err(e) => {
                self.error_line(&e.to_string());
                return;
            }
        };

        let mut handle = ChildHandle::new(child);
        let readers = runner::spawn_readers(
            &mut handle,
            Arc::clone(&self.logs),
            Arc::new(StderrTail::new()),
        );

        let waited = handle.wait().await;
        for reader in readers {
            let _ = reader.await;
        }
        match waited {
            Ok(status) if status.success() => {
                info!("build succeeded, starting in production mode");
                self.start(Some(Mode::Production), None).await;
            }
            Ok(status) => {
                self.error_line(&format!("build failed with {status}"));
            }
            Err(e) => {
                self.error_line(&format!("build could not be awaited: {e}"));
            }
        }
    }

    /// The exit-handling sequence, entered once per run by its watcher.
    async fn handle_exit(self: &Arc<Self>, run: u64, outcome: ExitOutcome) {
        let mut state = self.state.lock().await;
        if state.run != run {
            // A newer run superseded this watcher.
            return;
        }

        // Monitors off, pid cleared, readings reset.
        state.run_token.cancel();
        state.pid = None;
        state.watcher = None;
        *self.memory.write().await = None;

        // Drain the run's streams first: every log line of the run precedes
        // its terminal status event, and nothing trails a completed stop().
        for reader in state.readers.split_off(0) {
            let _ = reader.await;
        }

        let uptime = state
            .started_at
            .take()
            .map(|started| started.elapsed())
            .unwrap_or_default();

        let (exit_code, signal, requested) = match &outcome {
            ExitOutcome::Exited(status) => {
                let (code, signal) = describe_exit(*status);
                (code, signal, false)
            }
            ExitOutcome::Terminated(Some(status)) => {
                let (code, signal) = describe_exit(*status);
                (code, signal, true)
            }
            ExitOutcome::Terminated(None) => (None, None, true),
        };

        // Orderly end: stop-requested teardown or a clean exit.
        if requested || state.status == Status::Stopped || exit_code == Some(0) {
            self.transition(&mut state, Status::Stopped).await;
            return;
        }

        let entry = CrashEntry {
            timestamp: epoch_ms(),
            exit_code,
            signal,
            uptime_ms: uptime.as_millis() as u64,
            stderr: state.stderr.excerpt(),
        };
        state.crashes.push(entry.clone());
        if let Err(e) = self.store.save_crashes(&state.crashes).await {
            warn!(error = %e, "crash history not persisted");
        }

        let window_width = state.window_width();
        let recent = state.window.record(Instant::now(), window_width);
        warn!(exit_code = ?entry.exit_code, signal = ?entry.signal, uptime_ms = entry.uptime_ms, recent, "target crashed");

        self.bus.publish(Event::now(EventKind::Crash).with_crash(entry));
        self.transition(&mut state, Status::Crashed).await;

        if !state.config.auto_restart {
            return;
        }

        if recent >= state.config.max_restarts {
            self.transition(&mut state, Status::MaxRestarts).await;
            let snap = self.snapshot_locked(&mut state).await;
            self.bus
                .publish(Event::now(EventKind::MaxRestarts).with_status(snap));
            return;
        }

        // A long healthy run rewinds the ladder: sustained-failure loops
        // keep climbing, intermittent crashes do not.
        if self.backoff.is_stable(uptime) {
            state.backoff = self.backoff.first;
        }

        self.transition(&mut state, Status::Restarting).await;
        let delay = state.backoff;
        state.backoff = self.backoff.next(Some(delay));

        state.backoff_token.cancel();
        state.backoff_token = CancellationToken::new();
        let token = state.backoff_token.clone();
        let inner = Arc::clone(self);
        info!(delay_ms = delay.as_millis() as u64, "restart scheduled");
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
            // The token travels into start(): a cancellation that lands
            // after the sleep resolves is still honored under the lock.
            inner.start(None, Some(token)).await;
        });
    }

    async fn clear_crashes(&self) {
        let mut state = self.state.lock().await;
        state.crashes.clear();
        if let Err(e) = self.store.save_crashes(&state.crashes).await {
            warn!(error = %e, "crash history clear not persisted");
        }
    }

    async fn update_config(&self, patch: ConfigPatch) -> WatchdogConfig {
        let mut state = self.state.lock().await;
        let merged = state.config.apply(&patch);
        if let Err(e) = merged.validate() {
            self.error_line(&format!("config patch rejected: {e}"));
            return state.config.clone();
        }

        state.config = merged.clone();
        if let Some(mode) = patch.mode {
            // Takes effect on the next start; the running child is untouched.
            state.mode = mode;
        }
        drop(state);

        if let Err(e) = self.store.save_config(&merged).await {
            warn!(error = %e, "config not persisted");
        }
        merged
    }

    /// Status snapshot without an already-held lock.
    async fn snapshot(&self) -> StatusInfo {
        let mut state = self.state.lock().await;
        self.snapshot_locked(&mut state).await
    }

    /// Assembles the snapshot under the state lock.
    async fn snapshot_locked(&self, state: &mut State) -> StatusInfo {
        let probe = *self.probe_state.read().await;
        let memory = *self.memory.read().await;
        let now = Instant::now();
        let window = state.window_width();

        StatusInfo {
            status: state.status,
            mode: state.mode,
            exe_path: state.config.resolved_path(state.mode).to_string(),
            pid: state.pid,
            uptime_ms: state.uptime_ms(now),
            total_crashes: state.crashes.len() as u64,
            recent_crashes: state.window.count(now, window),
            backoff_ms: state.backoff.as_millis() as u64,
            last_health_check: probe.last_check,
            health_check_ok: probe.ok,
            memory,
            cpu: None,
        }
    }

    /// Moves the state machine and publishes `status-changed` on change.
    async fn transition(&self, state: &mut State, to: Status) {
        if state.status == to {
            return;
        }
        state.status = to;
        let snap = self.snapshot_locked(state).await;
        self.bus
            .publish(Event::now(EventKind::StatusChanged).with_status(snap));
    }

    /// Pushes a supervisor-originated error line into the ring.
    fn error_line(&self, message: &str) {
        warn!("{message}");
        self.logs
            .push_line(message, LogSource::Stderr, LogCategory::System);
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
