//! Policies governing when the target is restarted:
//!  - [`BackoffPolicy`] for restart delays;
//!  - [`CrashWindow`] for the rolling crash-rate limit.
//!
//! ## Overview
//! - [`backoff`] — compute the next delay after crashes with capped
//!   multiplicative growth and a stability rewind.
//! - [`window`] — count crashes inside a rolling time window, pruning on
//!   record and on query.
//!
//! ## Example
//! ```rust
//! use std::time::{Duration, Instant};
//! use hekavisor::{BackoffPolicy, CrashWindow};
//!
//! let backoff = BackoffPolicy::default();
//! let mut window = CrashWindow::new();
//!
//! // Two quick crashes: the delay ladder climbs, the window counts both.
//! let now = Instant::now();
//! assert_eq!(window.record(now, Duration::from_secs(300)), 1);
//! assert_eq!(window.record(now, Duration::from_secs(300)), 2);
//!
//! let first = backoff.next(None);
//! assert_eq!(backoff.next(Some(first)), Duration::from_secs(2));
//! ```

mod backoff;
mod window;

pub use backoff::BackoffPolicy;
pub use window::CrashWindow;
