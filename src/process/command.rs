//! # Target command construction.
//!
//! Builds the [`tokio::process::Command`] for each launch flavor:
//!
//! - **dev** — the project dev command (`npx electron-vite dev`) with the
//!   source tree as working directory;
//! - **production** — the packaged binary, executed directly;
//! - **build** — the project build command (`npx electron-vite build`),
//!   used by `build_and_run`.
//!
//! Every child gets the parent environment plus `HEKABRAIN_API_PORT` so the
//! target knows where to expose its health endpoint. Stdout and stderr are
//! piped for line capture; stdin is discarded.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::{Mode, WatchdogConfig};
use crate::error::WatchdogError;

/// Environment variable carrying the health port to the child.
pub const ENV_API_PORT: &str = "HEKABRAIN_API_PORT";

const DEV_PROGRAM: &str = "npx";
const DEV_ARGS: &[&str] = &["electron-vite", "dev"];
const BUILD_ARGS: &[&str] = &["electron-vite", "build"];

/// A fully resolved command line for one child run.
#[derive(Clone, Debug)]
pub struct TargetCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl TargetCommand {
    /// Resolves the launch command for the given mode.
    ///
    /// Fails with [`WatchdogError::MissingPath`] when the mode's path is not
    /// configured — the caller reports this as misconfiguration, not a crash.
    pub fn for_mode(cfg: &WatchdogConfig, mode: Mode) -> Result<Self, WatchdogError> {
        match mode {
            Mode::Dev => {
                let dev_path = non_empty(&cfg.target_dev_path, "dev path")?;
                Ok(Self {
                    program: DEV_PROGRAM.to_string(),
                    args: DEV_ARGS.iter().map(|s| s.to_string()).collect(),
                    cwd: Some(PathBuf::from(dev_path)),
                })
            }
            Mode::Production => {
                let exe = non_empty(&cfg.target_exe_path, "executable path")?;
                Ok(Self {
                    program: exe.to_string(),
                    args: Vec::new(),
                    cwd: None,
                })
            }
        }
    }

    /// Resolves the project build command (requires the dev path).
    pub fn for_build(cfg: &WatchdogConfig) -> Result<Self, WatchdogError> {
        let dev_path = non_empty(&cfg.target_dev_path, "dev path")?;
        Ok(Self {
            program: DEV_PROGRAM.to_string(),
            args: BUILD_ARGS.iter().map(|s| s.to_string()).collect(),
            cwd: Some(PathBuf::from(dev_path)),
        })
    }

    /// Spawns the child with piped stdout/stderr and the health port in env.
    pub fn spawn(&self, health_port: u16) -> Result<Child, WatchdogError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(ENV_API_PORT, health_port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.spawn().map_err(|source| WatchdogError::Spawn {
            command: self.display(),
            source,
        })
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

fn non_empty<'a>(path: &'a str, what: &'static str) -> Result<&'a str, WatchdogError> {
    if path.trim().is_empty() {
        Err(WatchdogError::MissingPath { what })
    } else {
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_requires_dev_path() {
        let cfg = WatchdogConfig::default();
        assert!(matches!(
            TargetCommand::for_mode(&cfg, Mode::Dev),
            Err(WatchdogError::MissingPath { what: "dev path" })
        ));
    }

    #[test]
    fn production_mode_runs_the_binary_directly() {
        let mut cfg = WatchdogConfig::default();
        cfg.target_exe_path = "/opt/app/bin".into();
        let cmd = TargetCommand::for_mode(&cfg, Mode::Production).unwrap();
        assert_eq!(cmd.display(), "/opt/app/bin");
    }

    #[test]
    fn dev_and_build_use_the_project_commands() {
        let mut cfg = WatchdogConfig::default();
        cfg.target_dev_path = "/src/app".into();

        let dev = TargetCommand::for_mode(&cfg, Mode::Dev).unwrap();
        assert_eq!(dev.display(), "npx electron-vite dev");
        assert_eq!(dev.cwd.as_deref(), Some(std::path::Path::new("/src/app")));

        let build = TargetCommand::for_build(&cfg).unwrap();
        assert_eq!(build.display(), "npx electron-vite build");
    }
}
