//! Supervisor events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to the stream the shell consumes.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payloads
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the supervisor core (status transitions, crashes,
//!   max-restarts) and the log buffer (one `Log` event per pushed line).
//! - **Consumers**: the supervisor's fan-out listener (feeds the
//!   `SubscriberSet`) and any raw receiver from `Supervisor::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
