//! End-to-end supervision scenarios against real `/bin/sh` targets.
//!
//! Each test anchors its own `Store` in a temp directory and runs a small
//! shell script as the supervised target (production mode, so the script is
//! executed directly).

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use hekavisor::{
    ConfigPatch, EventKind, Mode, Status, Store, Supervisor, WatchdogConfig,
};

/// Writes an executable script into `dir` and returns its path.
fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

/// Boots a supervisor over a fresh store seeded with `cfg`.
async fn supervisor_with(dir: &Path, cfg: WatchdogConfig) -> Supervisor {
    let store = Store::at(dir.join("store"));
    store.save_config(&cfg).await.unwrap();
    Supervisor::with_store(store, Vec::new()).await
}

/// Polls until the supervisor reaches `expected` or the deadline passes.
async fn wait_for_status(sup: &Supervisor, expected: Status, deadline: Duration) {
    let reached = timeout(deadline, async {
        loop {
            if sup.status().await.status == expected {
                break;
            }
            sleep(Duration::from_millis(25)).await;
        }
    })
    .await;
    assert!(
        reached.is_ok(),
        "expected status {:?}, last seen {:?}",
        expected,
        sup.status().await.status
    );
}

fn production_config(exe: String) -> WatchdogConfig {
    WatchdogConfig {
        target_exe_path: exe,
        mode: Mode::Production,
        ..WatchdogConfig::default()
    }
}

#[tokio::test]
async fn clean_exit_is_never_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    // Lives just long enough for the post-start snapshot to observe it.
    let exe = script(dir.path(), "clean.sh", "sleep 1\nexit 0");
    let sup = supervisor_with(dir.path(), production_config(exe)).await;

    let started = sup.start(None).await;
    assert_eq!(started.status, Status::Running);
    assert!(started.pid.is_some());
    assert!(started.uptime_ms < 5_000);

    wait_for_status(&sup, Status::Stopped, Duration::from_secs(5)).await;

    let status = sup.status().await;
    assert_eq!(status.pid, None);
    assert_eq!(status.uptime_ms, 0);
    assert!(sup.crashes().await.is_empty());
}

#[tokio::test]
async fn crash_without_autorestart_stays_crashed_and_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "crash.sh", "echo boom >&2\nexit 3");
    let mut cfg = production_config(exe);
    cfg.auto_restart = false;
    let sup = supervisor_with(dir.path(), cfg).await;
    let mut events = sup.subscribe();

    sup.start(None).await;
    wait_for_status(&sup, Status::Crashed, Duration::from_secs(5)).await;

    let crashes = sup.crashes().await;
    assert_eq!(crashes.len(), 1);
    assert_eq!(crashes[0].exit_code, Some(3));
    assert_eq!(crashes[0].signal, None);
    assert!(crashes[0].stderr.contains("boom"));

    // The history survives a supervisor restart (same store).
    let store = Store::at(dir.path().join("store"));
    assert_eq!(store.load_crashes().await.len(), 1);

    // Ordering: running precedes the crash, the crash precedes crashed.
    let mut running_seq = None;
    let mut crash_seq = None;
    let mut crashed_seq = None;
    while let Ok(ev) = events.try_recv() {
        match ev.kind {
            EventKind::StatusChanged => {
                let status = ev.status.as_ref().unwrap().status;
                if status == Status::Running && running_seq.is_none() {
                    running_seq = Some(ev.seq);
                }
                if status == Status::Crashed {
                    crashed_seq = Some(ev.seq);
                }
            }
            EventKind::Crash => crash_seq = Some(ev.seq),
            _ => {}
        }
    }
    let (running, crash, crashed) = (
        running_seq.expect("running event"),
        crash_seq.expect("crash event"),
        crashed_seq.expect("crashed event"),
    );
    assert!(running < crash && crash < crashed);
}

#[tokio::test]
async fn exhausted_window_halts_in_max_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "crash.sh", "exit 1");
    let mut cfg = production_config(exe);
    cfg.max_restarts = 1;
    let sup = supervisor_with(dir.path(), cfg).await;
    let mut events = sup.subscribe();

    sup.start(None).await;
    wait_for_status(&sup, Status::MaxRestarts, Duration::from_secs(5)).await;

    let status = sup.status().await;
    assert_eq!(status.recent_crashes, 1);
    assert_eq!(sup.crashes().await.len(), 1);

    let mut saw_max_restarts = false;
    while let Ok(ev) = events.try_recv() {
        saw_max_restarts |= ev.kind == EventKind::MaxRestarts;
    }
    assert!(saw_max_restarts);

    // No new spawn happens while halted.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(sup.status().await.status, Status::MaxRestarts);
}

#[tokio::test]
async fn restart_leaves_max_restarts_and_resets_counters() {
    let dir = tempfile::tempdir().unwrap();
    let crash = script(dir.path(), "crash.sh", "exit 1");
    let steady = script(dir.path(), "steady.sh", "sleep 30");
    let mut cfg = production_config(crash);
    cfg.max_restarts = 1;
    let sup = supervisor_with(dir.path(), cfg).await;

    sup.start(None).await;
    wait_for_status(&sup, Status::MaxRestarts, Duration::from_secs(5)).await;

    // Point at a stable target and restart: counters rewind, child runs.
    sup.update_config(ConfigPatch {
        target_exe_path: Some(steady),
        ..ConfigPatch::default()
    })
    .await;
    let restarted = sup.restart().await;
    assert_eq!(restarted.status, Status::Running);
    assert_eq!(restarted.recent_crashes, 0);
    assert_eq!(restarted.backoff_ms, 1_000);

    sup.stop().await;
}

#[tokio::test]
async fn crash_schedules_restart_and_advances_the_ladder() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "crash.sh", "exit 1");
    let sup = supervisor_with(dir.path(), production_config(exe)).await;

    sup.start(None).await;
    wait_for_status(&sup, Status::Restarting, Duration::from_secs(5)).await;

    // The 1 s rung is armed; the ladder has already moved to 2 s.
    assert_eq!(sup.status().await.backoff_ms, 2_000);

    // Stop during `restarting`: the scheduled spawn never happens and the
    // ladder position is left as-is.
    sup.stop().await;
    assert_eq!(sup.status().await.status, Status::Stopped);
    assert_eq!(sup.status().await.backoff_ms, 2_000);
    sleep(Duration::from_millis(1_300)).await;
    let status = sup.status().await;
    assert_eq!(status.status, Status::Stopped);
    assert_eq!(status.pid, None);
}

#[tokio::test]
async fn stop_is_idempotent_and_start_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "steady.sh", "sleep 30");
    let sup = supervisor_with(dir.path(), production_config(exe)).await;

    sup.start(None).await;
    wait_for_status(&sup, Status::Running, Duration::from_secs(5)).await;

    for _ in 0..3 {
        let stopped = sup.stop().await;
        assert_eq!(stopped.status, Status::Stopped);
        assert_eq!(stopped.pid, None);
    }

    let started = sup.start(None).await;
    assert_eq!(started.status, Status::Running);
    assert!(started.pid.is_some());
    sup.stop().await;
}

#[tokio::test]
async fn stop_terminates_a_hanging_child() {
    let dir = tempfile::tempdir().unwrap();
    // The target ignores SIGTERM; stop must fall through to the force kill.
    let exe = script(dir.path(), "stubborn.sh", "trap '' TERM\nsleep 30");
    let sup = supervisor_with(dir.path(), production_config(exe)).await;

    sup.start(None).await;
    wait_for_status(&sup, Status::Running, Duration::from_secs(5)).await;
    // Give the shell a beat to install its trap.
    sleep(Duration::from_millis(200)).await;

    let stopped = sup.stop().await;
    assert_eq!(stopped.status, Status::Stopped);
    assert_eq!(stopped.pid, None);
    // Forced teardown is an orderly stop, not a crash.
    assert!(sup.crashes().await.is_empty());
}

#[tokio::test]
async fn updated_config_survives_reinstantiation() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor_with(dir.path(), WatchdogConfig::default()).await;

    let merged = sup
        .update_config(ConfigPatch {
            max_restarts: Some(3),
            ..ConfigPatch::default()
        })
        .await;
    assert_eq!(merged.max_restarts, 3);

    // Re-instantiating the core simulates a supervisor process restart.
    let store = Store::at(dir.path().join("store"));
    let reopened = Supervisor::with_store(store, Vec::new()).await;
    assert_eq!(reopened.config().await.max_restarts, 3);
}

#[tokio::test]
async fn invalid_patch_is_rejected_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor_with(dir.path(), WatchdogConfig::default()).await;

    let kept = sup
        .update_config(ConfigPatch {
            max_restarts: Some(0),
            health_check_port: Some(4000),
            ..ConfigPatch::default()
        })
        .await;
    // Neither field of the bad patch lands.
    assert_eq!(kept.max_restarts, 5);
    assert_eq!(kept.health_check_port, 3001);
}

#[tokio::test]
async fn misconfigured_start_stops_without_recording_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    // Production mode with no executable configured.
    let mut cfg = WatchdogConfig::default();
    cfg.mode = Mode::Production;
    let sup = supervisor_with(dir.path(), cfg).await;

    let status = sup.start(None).await;
    assert_eq!(status.status, Status::Stopped);
    assert!(sup.crashes().await.is_empty());

    // The failure surfaced as an error log line.
    let lines = sup.logs(None, None).await;
    assert!(lines
        .iter()
        .any(|l| l.message.contains("executable path")));
}

#[tokio::test]
async fn clear_crashes_empties_memory_and_disk() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "crash.sh", "exit 1");
    let mut cfg = production_config(exe);
    cfg.auto_restart = false;
    let sup = supervisor_with(dir.path(), cfg).await;

    sup.start(None).await;
    wait_for_status(&sup, Status::Crashed, Duration::from_secs(5)).await;
    assert_eq!(sup.crashes().await.len(), 1);

    sup.clear_crashes().await;
    assert!(sup.crashes().await.is_empty());
    let store = Store::at(dir.path().join("store"));
    assert!(store.load_crashes().await.is_empty());
}

#[tokio::test]
async fn healthy_probe_reports_ok_and_failures_do_not_change_state() {
    let dir = tempfile::tempdir().unwrap();
    let exe = script(dir.path(), "steady.sh", "sleep 30");
    let mut cfg = production_config(exe);
    cfg.health_check_interval_ms = 100;

    // A minimal /status endpoint on an ephemeral port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    cfg.health_check_port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            let mut buf = [0u8; 512];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                .await;
        }
    });

    let sup = supervisor_with(dir.path(), cfg).await;
    sup.start(None).await;

    let healthy = timeout(Duration::from_secs(5), async {
        loop {
            let status = sup.status().await;
            if status.health_check_ok && status.last_health_check.is_some() {
                break;
            }
            sleep(Duration::from_millis(25)).await;
        }
    })
    .await;
    assert!(healthy.is_ok(), "probe never reported healthy");

    // Kill the endpoint: the probe flips to not-OK, the child keeps running.
    server.abort();
    let unhealthy = timeout(Duration::from_secs(5), async {
        loop {
            if !sup.status().await.health_check_ok {
                break;
            }
            sleep(Duration::from_millis(25)).await;
        }
    })
    .await;
    assert!(unhealthy.is_ok(), "probe never reported unhealthy");
    assert_eq!(sup.status().await.status, Status::Running);

    sup.stop().await;
}
