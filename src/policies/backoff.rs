//! # Backoff policy for restarting the target.
//!
//! [`BackoffPolicy`] controls how restart delays grow after repeated crashes.
//! It is parameterized by:
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::stable_uptime`] the run length that rewinds the ladder.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use hekavisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! // First crash - uses 'first'
//! assert_eq!(backoff.next(None), Duration::from_secs(1));
//!
//! // Each further crash doubles (1s -> 2s -> 4s -> ... -> 30s cap)
//! assert_eq!(backoff.next(Some(Duration::from_secs(1))), Duration::from_secs(2));
//! assert_eq!(backoff.next(Some(Duration::from_secs(16))), Duration::from_secs(30));
//! ```

use std::time::Duration;

/// Restart backoff policy.
///
/// Encapsulates the delay ladder: `first`, then multiplied by `factor` per
/// crash, capped at `max`. A run that stays up longer than `stable_uptime`
/// rewinds the ladder to `first` — sustained-failure loops keep climbing,
/// intermittent crashes do not.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first restart.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Uptime after which the ladder rewinds to `first`.
    pub stable_uptime: Duration,
}

impl Default for BackoffPolicy {
    /// Returns the supervisor ladder:
    /// - `first = 1s`;
    /// - `factor = 2.0` (1s, 2s, 4s, 8s, 16s, 30s);
    /// - `max = 30s`;
    /// - `stable_uptime = 60s`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            stable_uptime: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Computes the next delay based on the previous one.
    ///
    /// - If `prev` is `None`, returns `first` **clamped to `max`**.
    /// - Otherwise multiplies the previous delay by [`BackoffPolicy::factor`]
    ///   and caps it at [`BackoffPolicy::max`].
    pub fn next(&self, prev: Option<Duration>) -> Duration {
        let unclamped = match prev {
            None => self.first,
            Some(d) => {
                let mul = d.as_secs_f64() * self.factor;
                if !mul.is_finite() {
                    self.max
                } else {
                    d.mul_f64(self.factor)
                }
            }
        };

        if unclamped > self.max {
            self.max
        } else {
            unclamped
        }
    }

    /// True when a run of the given length rewinds the ladder.
    pub fn is_stable(&self, uptime: Duration) -> bool {
        uptime > self.stable_uptime
    }
}
