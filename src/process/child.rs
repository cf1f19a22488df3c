//! # Child process handle.
//!
//! [`ChildHandle`] wraps the spawned [`tokio::process::Child`] with the
//! teardown contract: graceful termination (SIGTERM on Unix), a bounded wait,
//! then force kill. The handle is owned exclusively by the run's exit
//! watcher; the rest of the supervisor sees only the PID.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::warn;

/// How long a graceful termination may take before force kill.
pub const KILL_GRACE: Duration = Duration::from_secs(5);

/// Owned handle to one child run.
pub struct ChildHandle {
    child: Child,
    pid: Option<u32>,
}

impl ChildHandle {
    /// Wraps a freshly spawned child.
    pub fn new(child: Child) -> Self {
        let pid = child.id();
        Self { child, pid }
    }

    /// PID captured at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Takes the child's stdout pipe (once).
    pub fn take_stdout(&mut self) -> Option<tokio::process::ChildStdout> {
        self.child.stdout.take()
    }

    /// Takes the child's stderr pipe (once).
    pub fn take_stderr(&mut self) -> Option<tokio::process::ChildStderr> {
        self.child.stderr.take()
    }

    /// Waits for the child to exit on its own.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Terminates the child: graceful signal, bounded wait, force kill.
    ///
    /// Returns the observed exit status when one could be collected. A
    /// force-kill after the grace period is logged and otherwise treated as
    /// a normal exit.
    pub async fn terminate(&mut self) -> Option<ExitStatus> {
        self.signal_graceful();

        match timeout(KILL_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!(error = %e, "wait after graceful termination failed");
                None
            }
            Err(_elapsed) => {
                warn!(grace = ?KILL_GRACE, "child ignored graceful termination, force killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "force kill failed");
                }
                self.child.wait().await.ok()
            }
        }
    }

    #[cfg(unix)]
    fn signal_graceful(&mut self) {
        match self.pid {
            // SAFETY: plain kill(2) with a validated pid; no memory involved.
            Some(pid) => unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            },
            None => {
                let _ = self.child.start_kill();
            }
        }
    }

    #[cfg(not(unix))]
    fn signal_graceful(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Splits an exit status into the crash record's `(exitCode, signal)` pair.
pub fn describe_exit(status: ExitStatus) -> (Option<i32>, Option<String>) {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return (None, Some(signal_name(sig)));
        }
    }
    (status.code(), None)
}

#[cfg(unix)]
fn signal_name(sig: i32) -> String {
    match sig {
        libc::SIGHUP => "SIGHUP".to_string(),
        libc::SIGINT => "SIGINT".to_string(),
        libc::SIGQUIT => "SIGQUIT".to_string(),
        libc::SIGABRT => "SIGABRT".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        libc::SIGSEGV => "SIGSEGV".to_string(),
        libc::SIGTERM => "SIGTERM".to_string(),
        other => format!("SIG{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn clean_exit_reports_code_zero() {
        let child = tokio::process::Command::new("/bin/sh")
            .args(["-c", "exit 0"])
            .spawn()
            .unwrap();
        let mut handle = ChildHandle::new(child);
        let status = handle.wait().await.unwrap();
        assert_eq!(describe_exit(status), (Some(0), None));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_its_code() {
        let child = tokio::process::Command::new("/bin/sh")
            .args(["-c", "exit 3"])
            .spawn()
            .unwrap();
        let mut handle = ChildHandle::new(child);
        let status = handle.wait().await.unwrap();
        assert_eq!(describe_exit(status), (Some(3), None));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_stops_a_long_running_child() {
        let child = tokio::process::Command::new("/bin/sh")
            .args(["-c", "sleep 30"])
            .spawn()
            .unwrap();
        let mut handle = ChildHandle::new(child);
        let status = handle.terminate().await.expect("status collected");
        let (code, signal) = describe_exit(status);
        assert_eq!(code, None);
        assert_eq!(signal.as_deref(), Some("SIGTERM"));
    }
}
