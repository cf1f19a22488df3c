//! # Persisted supervisor configuration.
//!
//! [`WatchdogConfig`] is the single configuration document: which target to
//! run (and in which [`Mode`]), the restart policy bounds, and the health
//! probe endpoint. It is stored as camelCase JSON by the
//! [`Store`](crate::store::Store); unknown keys are ignored on read and
//! missing keys take the documented defaults, so older or hand-edited files
//! keep loading.
//!
//! # Example
//! ```
//! use hekavisor::{Mode, WatchdogConfig};
//!
//! let cfg: WatchdogConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(cfg.mode, Mode::Dev);
//! assert_eq!(cfg.max_restarts, 5);
//! assert!(cfg.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::WatchdogError;

/// How the target is launched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the project's dev command inside the source tree.
    Dev,
    /// Execute the packaged target binary directly.
    Production,
}

impl Default for Mode {
    /// Returns [`Mode::Dev`].
    fn default() -> Self {
        Mode::Dev
    }
}

impl Mode {
    /// Stable lowercase name, matching the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Dev => "dev",
            Mode::Production => "production",
        }
    }
}

/// Supervisor configuration document.
///
/// Persisted at `~/.claude-launcher/watchdog-config.json`. Every field has a
/// default so a missing or partial file always yields a usable config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchdogConfig {
    /// Absolute path to the packaged executable (production mode).
    pub target_exe_path: String,
    /// Absolute path to the source tree (dev mode working directory).
    pub target_dev_path: String,
    /// Launch mode used by `start()` when no explicit mode is given.
    pub mode: Mode,
    /// When `false`, a crash leaves the supervisor in `crashed` with no respawn.
    pub auto_restart: bool,
    /// Crash count allowed inside the rolling window before `max_restarts`.
    pub max_restarts: u32,
    /// Width of the rolling crash-rate window, in milliseconds.
    pub restart_window_ms: u64,
    /// TCP port the target serves its health endpoint on.
    pub health_check_port: u16,
    /// Health probe cadence, in milliseconds.
    pub health_check_interval_ms: u64,
}

impl Default for WatchdogConfig {
    /// Provides the documented defaults:
    /// - `mode = dev`
    /// - `autoRestart = true`
    /// - `maxRestarts = 5`
    /// - `restartWindowMs = 300000`
    /// - `healthCheckPort = 3001`
    /// - `healthCheckIntervalMs = 10000`
    fn default() -> Self {
        Self {
            target_exe_path: String::new(),
            target_dev_path: String::new(),
            mode: Mode::default(),
            auto_restart: true,
            max_restarts: 5,
            restart_window_ms: 300_000,
            health_check_port: 3001,
            health_check_interval_ms: 10_000,
        }
    }
}

impl WatchdogConfig {
    /// Checks the documented bounds.
    ///
    /// - `maxRestarts >= 1`
    /// - `restartWindowMs > 0`
    /// - `healthCheckPort in 1..=65535`
    /// - `healthCheckIntervalMs > 0`
    pub fn validate(&self) -> Result<(), WatchdogError> {
        if self.max_restarts < 1 {
            return Err(invalid("maxRestarts must be >= 1"));
        }
        if self.restart_window_ms == 0 {
            return Err(invalid("restartWindowMs must be > 0"));
        }
        if self.health_check_port == 0 {
            return Err(invalid("healthCheckPort must be in 1..=65535"));
        }
        if self.health_check_interval_ms == 0 {
            return Err(invalid("healthCheckIntervalMs must be > 0"));
        }
        Ok(())
    }

    /// Path the given mode resolves to (dev tree or packaged binary).
    pub fn resolved_path(&self, mode: Mode) -> &str {
        match mode {
            Mode::Dev => &self.target_dev_path,
            Mode::Production => &self.target_exe_path,
        }
    }

    /// Returns a copy with the patch's set fields applied.
    ///
    /// The caller validates the merged result before adopting it; `apply`
    /// itself never rejects.
    pub fn apply(&self, patch: &ConfigPatch) -> WatchdogConfig {
        let mut next = self.clone();
        if let Some(v) = &patch.target_exe_path {
            next.target_exe_path = v.clone();
        }
        if let Some(v) = &patch.target_dev_path {
            next.target_dev_path = v.clone();
        }
        if let Some(v) = patch.mode {
            next.mode = v;
        }
        if let Some(v) = patch.auto_restart {
            next.auto_restart = v;
        }
        if let Some(v) = patch.max_restarts {
            next.max_restarts = v;
        }
        if let Some(v) = patch.restart_window_ms {
            next.restart_window_ms = v;
        }
        if let Some(v) = patch.health_check_port {
            next.health_check_port = v;
        }
        if let Some(v) = patch.health_check_interval_ms {
            next.health_check_interval_ms = v;
        }
        next
    }
}

fn invalid(reason: &str) -> WatchdogError {
    WatchdogError::InvalidConfig {
        reason: reason.to_string(),
    }
}

/// Partial configuration update, as sent by the shell.
///
/// Every field is optional; unset fields leave the current value untouched.
/// Uses the same camelCase wire names as [`WatchdogConfig`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigPatch {
    pub target_exe_path: Option<String>,
    pub target_dev_path: Option<String>,
    pub mode: Option<Mode>,
    pub auto_restart: Option<bool>,
    pub max_restarts: Option<u32>,
    pub restart_window_ms: Option<u64>,
    pub health_check_port: Option<u16>,
    pub health_check_interval_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: WatchdogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, WatchdogConfig::default());
        assert_eq!(cfg.max_restarts, 5);
        assert_eq!(cfg.restart_window_ms, 300_000);
        assert_eq!(cfg.health_check_port, 3001);
        assert_eq!(cfg.health_check_interval_ms, 10_000);
        assert!(cfg.auto_restart);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cfg: WatchdogConfig =
            serde_json::from_str(r#"{"maxRestarts": 3, "somethingNew": {"a": 1}}"#).unwrap();
        assert_eq!(cfg.max_restarts, 3);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(WatchdogConfig::default()).unwrap();
        assert!(json.get("targetExePath").is_some());
        assert!(json.get("restartWindowMs").is_some());
        assert_eq!(json.get("mode").unwrap(), "dev");
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let mut cfg = WatchdogConfig::default();
        cfg.max_restarts = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = WatchdogConfig::default();
        cfg.restart_window_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = WatchdogConfig::default();
        cfg.health_check_port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = WatchdogConfig::default();
        cfg.health_check_interval_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let cfg = WatchdogConfig::default();
        let patch = ConfigPatch {
            max_restarts: Some(3),
            mode: Some(Mode::Production),
            ..ConfigPatch::default()
        };
        let merged = cfg.apply(&patch);
        assert_eq!(merged.max_restarts, 3);
        assert_eq!(merged.mode, Mode::Production);
        assert_eq!(merged.restart_window_ms, cfg.restart_window_ms);
        assert_eq!(merged.target_exe_path, cfg.target_exe_path);
    }

    #[test]
    fn resolved_path_follows_mode() {
        let mut cfg = WatchdogConfig::default();
        cfg.target_dev_path = "/src/app".into();
        cfg.target_exe_path = "/opt/app/bin".into();
        assert_eq!(cfg.resolved_path(Mode::Dev), "/src/app");
        assert_eq!(cfg.resolved_path(Mode::Production), "/opt/app/bin");
    }
}
