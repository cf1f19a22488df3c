//! # Error types used by the supervisor.
//!
//! [`WatchdogError`] covers the internal fallible paths: spawning the target,
//! persistence I/O, and configuration validation.
//!
//! Public operations never surface these to the caller — the facade converts
//! them into `error` log entries and status transitions. The type exists so
//! that internal helpers can propagate with `?` and so that the failure site
//! is recorded precisely.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the supervision runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WatchdogError {
    /// The target executable or dev command could not be spawned.
    #[error("failed to spawn target `{command}`: {source}")]
    Spawn {
        /// The program that was asked to run.
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A persistence read or write failed.
    #[error("store I/O on {path}: {source}")]
    StoreIo {
        /// File the operation touched.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted document could not be parsed or encoded.
    #[error("store serialization on {path}: {source}")]
    StoreSerde {
        /// File the operation touched.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration document or patch failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which bound was violated.
        reason: String,
    },

    /// No path is configured for the mode a start was requested in.
    #[error("no {what} configured for the requested mode")]
    MissingPath {
        /// Human name of the missing path ("executable path" / "dev path").
        what: &'static str,
    },

    /// The home directory could not be resolved for the persistent store.
    #[error("cannot resolve home directory for the persistent store")]
    NoHome,
}

impl WatchdogError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchdogError::Spawn { .. } => "spawn_failed",
            WatchdogError::StoreIo { .. } => "store_io",
            WatchdogError::StoreSerde { .. } => "store_serde",
            WatchdogError::InvalidConfig { .. } => "invalid_config",
            WatchdogError::MissingPath { .. } => "missing_path",
            WatchdogError::NoHome => "no_home",
        }
    }
}
