//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery for
//! handling supervisor events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   core / log buffer ── publish(Event) ──► Bus ──► fan-out listener
//!                                                        │
//!                                                 SubscriberSet
//!                                              ┌────────┴─────────┐
//!                                              ▼                  ▼
//!                                         TraceWriter      shell bridge, ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use hekavisor::{Event, EventKind, Subscribe};
//!
//! struct CrashCounter;
//!
//! #[async_trait]
//! impl Subscribe for CrashCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::Crash {
//!             // increment a counter, page someone, ...
//!         }
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::TraceWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
