//! Retry policy for upstream requests.
//!
//! The attempt counter lives in a [`RetryState`] value that the request loop
//! threads through by value; nothing on the request itself is mutated.

use crate::constants::{INITIAL_BACKOFF_MS, MAX_RETRIES, MAX_RETRY_AFTER_SECS};
use crate::error::ApiError;
use std::time::Duration;

/// How many times and how long to wait before retrying a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Delay before the first retry when upstream gives no hint.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

/// Retries performed so far for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryState {
    pub retries: u32,
}

impl RetryState {
    /// State before the first attempt.
    pub fn initial() -> Self {
        Self::default()
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
        }
    }

    /// Exponential delay for the given retry (1-based): initial × 2^(n−1).
    pub fn backoff_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(1u32 << exponent)
    }

    /// Decides whether `error` should be retried.
    ///
    /// Returns the next state and the delay to wait, or `None` when the error
    /// is permanent or the retry budget is spent.
    pub fn next(&self, state: RetryState, error: &ApiError) -> Option<(RetryState, Duration)> {
        if !error.is_retryable() || state.retries >= self.max_retries {
            return None;
        }

        let next = RetryState {
            retries: state.retries + 1,
        };
        let delay = error
            .retry_after()
            .unwrap_or_else(|| self.backoff_for_retry(next.retries));

        Some((next, delay))
    }
}

/// Parses a `Retry-After` header given in seconds.
///
/// HTTP-date values and delays above `MAX_RETRY_AFTER_SECS` are not
/// honoured; the caller falls back to exponential backoff for them.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 || secs > MAX_RETRY_AFTER_SECS as f64 {
        return None;
    }
    Some(Duration::from_millis((secs * 1000.0).round() as u64))
}
