//! # One child run: stream capture and exit watching.
//!
//! Helpers the supervisor wires around a freshly spawned child:
//!
//! - [`spawn_readers`] attaches line-oriented reader tasks to the child's
//!   stdout and stderr. Stdout lines go straight into the log ring; stderr
//!   lines additionally feed the per-run [`StderrTail`] so a crash can carry
//!   its excerpt. Readers end on their own when the pipes close.
//! - [`watch_exit`] owns the [`ChildHandle`] until the run ends: either the
//!   child exits by itself, or the run token is cancelled and the watcher
//!   performs the graceful-then-forced teardown.
//!
//! ```text
//!   spawn ──► readers (stdout ─► ring, stderr ─► ring + tail)
//!         └─► watch_exit ──► ExitOutcome ──► Supervisor::handle_exit
//! ```

use std::process::ExitStatus;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::logs::{LogBuffer, LogCategory, LogSource};
use crate::process::{ChildHandle, StderrTail};

/// How one run ended.
pub(crate) enum ExitOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The run was torn down on request; the status may be unobservable
    /// when even the forced wait failed.
    Terminated(Option<ExitStatus>),
}

/// Attaches stdout/stderr reader tasks to the child.
///
/// The returned handles end at pipe EOF; the exit handler joins them so no
/// `log` event of a run trails the run's terminal status event.
pub(crate) fn spawn_readers(
    child: &mut ChildHandle,
    logs: Arc<LogBuffer>,
    stderr_tail: Arc<StderrTail>,
) -> Vec<JoinHandle<()>> {
    let mut readers = Vec::with_capacity(2);

    if let Some(stdout) = child.take_stdout() {
        let logs = Arc::clone(&logs);
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                logs.push_line(&line, LogSource::Stdout, LogCategory::Console);
            }
        }));
    }

    if let Some(stderr) = child.take_stderr() {
        readers.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                stderr_tail.append(&line);
                stderr_tail.append("\n");
                logs.push_line(&line, LogSource::Stderr, LogCategory::Console);
            }
        }));
    }

    readers
}

/// Owns the child until the run ends, one way or the other.
pub(crate) async fn watch_exit(
    mut child: ChildHandle,
    run_token: CancellationToken,
) -> ExitOutcome {
    let natural = tokio::select! {
        status = child.wait() => Some(status),
        _ = run_token.cancelled() => None,
    };

    match natural {
        Some(Ok(status)) => ExitOutcome::Exited(status),
        Some(Err(e)) => {
            warn!(error = %e, "waiting on child failed");
            ExitOutcome::Terminated(None)
        }
        None => ExitOutcome::Terminated(child.terminate().await),
    }
}
