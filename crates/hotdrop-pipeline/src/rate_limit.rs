//! Global token-bucket rate limiter
//!
//! Every upload attempt acquires one token from a single shared
//! [`RateLimiter`]. The bucket holds at most `capacity` tokens, where
//! `capacity` is the configured requests-per-minute, and refills at
//! `capacity / 60` tokens per second. It starts full, so a batch dropped
//! after an idle period goes out in a burst of up to `capacity` uploads
//! before the steady-state rate applies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hotdrop_pipeline::rate_limit::RateLimiter;
//!
//! # async fn example() -> Result<(), hotdrop_pipeline::PipelineError> {
//! let limiter = RateLimiter::per_minute(10)?;
//! limiter.acquire().await;
//! // ... make the upload call ...
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::PipelineError;

/// Mutable bucket state, only touched while the mutex is held.
#[derive(Debug)]
struct BucketState {
    /// Current number of available tokens (fractional for smooth refill)
    tokens: f64,
    /// Timestamp of the last refill calculation
    last_refill: Instant,
}

/// Token bucket shared by all upload attempts
///
/// The state lives behind an async mutex that is held across the refill
/// wait, so concurrent callers queue up behind each other and a token is
/// never spent twice.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum number of tokens in the bucket
    capacity: u32,
    /// Tokens added per second
    refill_rate: f64,
    inner: Mutex<BucketState>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_minute` uploads per minute
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] when `requests_per_minute`
    /// is zero, since such a bucket could never refill.
    pub fn per_minute(requests_per_minute: u32) -> Result<Self, PipelineError> {
        if requests_per_minute == 0 {
            return Err(PipelineError::InvalidConfig(
                "rate limit must allow at least one request per minute".to_string(),
            ));
        }

        Ok(Self {
            capacity: requests_per_minute,
            refill_rate: f64::from(requests_per_minute) / 60.0,
            inner: Mutex::new(BucketState {
                tokens: f64::from(requests_per_minute),
                last_refill: Instant::now(),
            }),
        })
    }

    /// Returns the bucket capacity (requests per minute)
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Adds the tokens accrued since the last refill, capped at capacity
    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed_secs = now.duration_since(state.last_refill).as_secs_f64();
        if elapsed_secs > 0.0 {
            state.tokens = (state.tokens + elapsed_secs * self.refill_rate).min(f64::from(self.capacity));
            state.last_refill = now;
        }
    }

    /// Waits until a token is available and consumes it
    ///
    /// If the bucket holds less than one token, sleeps exactly long enough
    /// for the deficit to refill and then leaves the bucket empty. Returns
    /// how long the caller was made to wait by the bucket itself (time spent
    /// queued behind other callers on the mutex is not included).
    pub async fn acquire(&self) -> Duration {
        let mut state = self.inner.lock().await;
        self.refill(&mut state, Instant::now());

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Duration::ZERO;
        }

        let wait = Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate);
        debug!(
            wait_ms = wait.as_millis() as u64,
            tokens = state.tokens,
            "Rate limit reached, waiting for refill"
        );
        tokio::time::sleep(wait).await;

        // The slept interval paid for this token; refill restarts from here.
        state.tokens = 0.0;
        state.last_refill = Instant::now();
        wait
    }

    /// Returns the current number of available tokens (after refill)
    pub async fn available(&self) -> f64 {
        let mut state = self.inner.lock().await;
        self.refill(&mut state, Instant::now());
        state.tokens
    }
}
