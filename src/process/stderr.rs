//! # Per-run stderr accumulator.
//!
//! [`StderrTail`] keeps the last 10 KiB of everything the child wrote to
//! stderr during the current run. On crash, the last 2 KiB are copied into
//! the [`CrashEntry`](crate::store::CrashEntry) as the post-mortem excerpt.
//! The accumulator is recreated on every spawn.

use std::sync::Mutex;

/// Retained stderr bytes per run.
pub const STDERR_CAP: usize = 10 * 1024;

/// Bytes copied into a crash entry.
pub const CRASH_EXCERPT: usize = 2 * 1024;

/// Tail-preserving stderr byte accumulator.
#[derive(Default)]
pub struct StderrTail {
    buf: Mutex<Vec<u8>>,
}

impl StderrTail {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk, dropping the oldest bytes past the cap.
    pub fn append(&self, chunk: &str) {
        let mut buf = self.buf.lock().expect("stderr tail poisoned");
        buf.extend_from_slice(chunk.as_bytes());
        let len = buf.len();
        if len > STDERR_CAP {
            buf.drain(..len - STDERR_CAP);
        }
    }

    /// Returns the crash excerpt: the last 2 KiB, lossily decoded.
    pub fn excerpt(&self) -> String {
        let buf = self.buf.lock().expect("stderr tail poisoned");
        let start = buf.len().saturating_sub(CRASH_EXCERPT);
        String::from_utf8_lossy(&buf[start..]).into_owned()
    }
}
