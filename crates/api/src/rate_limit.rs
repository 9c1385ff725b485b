//! Login throttling keyed by client IP plus email.
//!
//! Each key gets a GCRA quota of `n` attempts per minute: a burst of `n`,
//! after which one attempt is replenished every `60 / n` seconds.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Keys are swept of fully replenished state once the map grows past this.
const SWEEP_THRESHOLD: usize = 10_000;

/// In-memory limiter; state is per process and lost on restart.
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
}

impl LoginRateLimiter {
    /// `max_attempts_per_min` attempts per key per minute. Zero is treated as one.
    pub fn per_minute(max_attempts_per_min: u32) -> Self {
        let burst = NonZeroU32::new(max_attempts_per_min).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(burst)),
            clock: DefaultClock::default(),
        }
    }

    pub fn key(ip: Option<&str>, email: &str) -> String {
        format!("{}|{}", ip.unwrap_or("unknown"), email)
    }

    /// Count one attempt for `key`.
    ///
    /// Returns `Err(retry_after)` when the key has no attempts left.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        if self.limiter.len() > SWEEP_THRESHOLD {
            self.limiter.retain_recent();
        }
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}
