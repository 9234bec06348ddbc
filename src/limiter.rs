//! Live fetch rate limiting
//!
//! A token bucket of capacity one, refilled once per configured interval.
//! Acquiring never waits: when the token is gone the caller is rejected.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota};

/// Returned when no token is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

/// Non-blocking gate in front of live fetches
#[derive(Debug)]
pub struct RateLimiter {
    /// None when limiting is disabled (interval of zero)
    limiter: Option<DefaultDirectRateLimiter>,
    interval_ms: u64,
}

impl RateLimiter {
    /// Create a limiter allowing one live fetch per `interval_ms` milliseconds.
    ///
    /// The bucket starts full, so the first acquire succeeds. `0` disables
    /// limiting.
    pub fn new(interval_ms: u64) -> Self {
        let limiter = Quota::with_period(Duration::from_millis(interval_ms))
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(DefaultDirectRateLimiter::direct);
        Self {
            limiter,
            interval_ms,
        }
    }

    /// Take the token if one is available
    pub fn acquire(&self) -> Result<(), Busy> {
        match &self.limiter {
            Some(limiter) => limiter.check().map_err(|_| Busy),
            None => Ok(()),
        }
    }

    /// Configured refill interval in milliseconds
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
