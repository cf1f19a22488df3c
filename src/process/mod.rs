//! Platform surface for the supervised child.
//!
//! Everything OS-dependent about the target lives here:
//! - [`TargetCommand`] — resolve and spawn the dev/production/build command
//!   with the health port in the environment and piped streams;
//! - [`ChildHandle`] — exclusive owner of the spawned process; graceful
//!   SIGTERM, bounded wait, force kill;
//! - [`StderrTail`] — the per-run 10 KiB stderr accumulator feeding crash
//!   excerpts.

mod child;
mod command;
mod stderr;

pub use child::{describe_exit, ChildHandle, KILL_GRACE};
pub use command::{TargetCommand, ENV_API_PORT};
pub use stderr::{StderrTail, CRASH_EXCERPT, STDERR_CAP};
