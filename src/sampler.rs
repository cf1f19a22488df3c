//! # Resident memory sampler.
//!
//! Every 5 s while the target runs, the supervisor asks the OS for the
//! child's resident set size. Any parse or query failure yields `None`; the
//! reading resets to `None` when the child exits. CPU percentage is not
//! measured.
//!
//! Platform mechanisms:
//! - **Linux** — `VmRSS:` line of `/proc/<pid>/status` (kB).
//! - **macOS** — `ps -o rss= -p <pid>` (kB).
//! - **Windows** — `tasklist /FI "PID eq <pid>" /FO CSV /NH` ("12,345 K").

use std::time::Duration;

/// Sampling cadence.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Returns the child's resident memory in bytes, or `None` on any failure.
pub async fn sample_memory(pid: u32) -> Option<u64> {
    imp::sample(pid).await
}

#[cfg(target_os = "linux")]
mod imp {
    pub async fn sample(pid: u32) -> Option<u64> {
        let status = tokio::fs::read_to_string(format!("/proc/{pid}/status"))
            .await
            .ok()?;
        parse_vm_rss(&status)
    }

    /// Parses the `VmRSS:` line (value in kB).
    pub(super) fn parse_vm_rss(status: &str) -> Option<u64> {
        status
            .lines()
            .find(|l| l.starts_with("VmRSS:"))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use tokio::process::Command;

    pub async fn sample(pid: u32) -> Option<u64> {
        let out = Command::new("ps")
            .args(["-o", "rss=", "-p", &pid.to_string()])
            .output()
            .await
            .ok()?;
        if !out.status.success() {
            return None;
        }
        String::from_utf8_lossy(&out.stdout)
            .trim()
            .parse::<u64>()
            .ok()
            .map(|kb| kb * 1024)
    }
}

#[cfg(target_os = "windows")]
mod imp {
    use tokio::process::Command;

    pub async fn sample(pid: u32) -> Option<u64> {
        let out = Command::new("tasklist")
            .args(["/FI", &format!("PID eq {pid}"), "/FO", "CSV", "/NH"])
            .output()
            .await
            .ok()?;
        if !out.status.success() {
            return None;
        }
        parse_tasklist_csv(&String::from_utf8_lossy(&out.stdout))
    }

    /// Parses the memory column of a CSV row: `"name","pid",...,"12,345 K"`.
    pub(super) fn parse_tasklist_csv(row: &str) -> Option<u64> {
        let mem = row.trim().rsplit("\",\"").next()?;
        let digits: String = mem.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse::<u64>().ok().map(|kb| kb * 1024)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod imp {
    pub async fn sample(_pid: u32) -> Option<u64> {
        None
    }
}
