//! # Persistent store: configuration and crash history.
//!
//! Two pretty-printed JSON documents under `~/.claude-launcher/`:
//!
//! | File | Content |
//! |---|---|
//! | `watchdog-config.json` | [`WatchdogConfig`] |
//! | `watchdog-crashes.json` | `Vec<CrashEntry>`, chronological append |
//!
//! The directory is created lazily on first write. Reads tolerate absence
//! (defaults / empty list) and log-and-default on parse errors; writes are
//! full-file overwrites. There is no locking — the supervisor is the single
//! writer.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::config::WatchdogConfig;
use crate::error::WatchdogError;

/// Directory under the home dir holding both documents.
const STORE_DIR: &str = ".claude-launcher";
const CONFIG_FILE: &str = "watchdog-config.json";
const CRASHES_FILE: &str = "watchdog-crashes.json";

/// One observed crash, appended to the history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashEntry {
    /// Wall-clock time of the exit, epoch milliseconds.
    pub timestamp: u64,
    /// Exit code, when the child exited normally.
    pub exit_code: Option<i32>,
    /// Terminating signal name, when the child was killed by one.
    pub signal: Option<String>,
    /// How long the run lasted, in milliseconds.
    pub uptime_ms: u64,
    /// Last 2 KiB of the run's accumulated stderr.
    pub stderr: String,
}

/// Reader/writer for the two persisted documents.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens the store at its default location under the home directory.
    pub fn open() -> Result<Self, WatchdogError> {
        let home = dirs::home_dir().ok_or(WatchdogError::NoHome)?;
        Ok(Self::at(home.join(STORE_DIR)))
    }

    /// Opens the store at an explicit directory (tests, alternate roots).
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory both documents live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    fn crashes_path(&self) -> PathBuf {
        self.dir.join(CRASHES_FILE)
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// absent, unreadable, unparsable, or out of bounds.
    pub async fn load_config(&self) -> WatchdogConfig {
        let cfg: WatchdogConfig = self.read_json(&self.config_path()).await.unwrap_or_default();
        match cfg.validate() {
            Ok(()) => cfg,
            Err(e) => {
                warn!(error = %e, "persisted config out of bounds, using defaults");
                WatchdogConfig::default()
            }
        }
    }

    /// Persists the configuration as a full-file overwrite.
    pub async fn save_config(&self, cfg: &WatchdogConfig) -> Result<(), WatchdogError> {
        self.write_json(&self.config_path(), cfg).await
    }

    /// Loads the crash history; absent or unparsable files yield an empty list.
    pub async fn load_crashes(&self) -> Vec<CrashEntry> {
        self.read_json(&self.crashes_path()).await.unwrap_or_default()
    }

    /// Persists the full crash history as a full-file overwrite.
    pub async fn save_crashes(&self, crashes: &[CrashEntry]) -> Result<(), WatchdogError> {
        self.write_json(&self.crashes_path(), &crashes).await
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store parse failed");
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), WatchdogError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| WatchdogError::StoreIo {
                path: self.dir.clone(),
                source,
            })?;

        let mut body =
            serde_json::to_string_pretty(value).map_err(|source| WatchdogError::StoreSerde {
                path: path.to_path_buf(),
                source,
            })?;
        body.push('\n');

        tokio::fs::write(path, body)
            .await
            .map_err(|source| WatchdogError::StoreIo {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path().join("nested"));
        assert_eq!(store.load_config().await, WatchdogConfig::default());
        assert!(store.load_crashes().await.is_empty());
    }

    #[tokio::test]
    async fn config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());

        let mut cfg = WatchdogConfig::default();
        cfg.max_restarts = 3;
        cfg.target_exe_path = "/opt/app".into();
        store.save_config(&cfg).await.unwrap();

        // A second store over the same directory simulates a supervisor restart.
        let reopened = Store::at(dir.path());
        assert_eq!(reopened.load_config().await, cfg);
    }

    #[tokio::test]
    async fn crash_history_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());

        let crashes = vec![
            CrashEntry {
                timestamp: 1,
                exit_code: Some(1),
                signal: None,
                uptime_ms: 500,
                stderr: "first".into(),
            },
            CrashEntry {
                timestamp: 2,
                exit_code: None,
                signal: Some("SIGKILL".into()),
                uptime_ms: 70_000,
                stderr: "second".into(),
            },
        ];
        store.save_crashes(&crashes).await.unwrap();

        let loaded = store.load_crashes().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].timestamp, 1);
        assert_eq!(loaded[1].signal.as_deref(), Some("SIGKILL"));
    }

    #[tokio::test]
    async fn malformed_documents_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        tokio::fs::create_dir_all(store.dir()).await.unwrap();
        tokio::fs::write(store.config_path(), "{not json")
            .await
            .unwrap();
        tokio::fs::write(store.crashes_path(), "also not json")
            .await
            .unwrap();

        assert_eq!(store.load_config().await, WatchdogConfig::default());
        assert!(store.load_crashes().await.is_empty());
    }

    #[tokio::test]
    async fn out_of_bounds_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        tokio::fs::create_dir_all(store.dir()).await.unwrap();
        tokio::fs::write(store.config_path(), r#"{"maxRestarts": 0}"#)
            .await
            .unwrap();
        assert_eq!(store.load_config().await, WatchdogConfig::default());
    }

    #[test]
    fn crash_entry_wire_names() {
        let entry = CrashEntry {
            timestamp: 42,
            exit_code: Some(1),
            signal: None,
            uptime_ms: 10,
            stderr: String::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("exitCode").is_some());
        assert!(json.get("uptimeMs").is_some());
    }
}
