// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-principal token-bucket rate limiting (§4.5). Exhaustion denies
//! before any backend call is made and never rewinds on denial (monotonic).

use chrono::Utc;
use dgw_core::config::RateLimitConfig;
use dgw_core::{ErrorKind, GatewayError, GatewayResult, RateState};
use std::collections::HashMap;
use std::sync::Mutex;

/// A token bucket per principal, refilled continuously at
/// `requests_per_minute / 60` tokens/second, capped at `burst`.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, RateState>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to consume one token for `principal_id`. Never blocks — an
    /// exhausted bucket fails immediately with `rate_limited` (§5: rate-limit
    /// acquisition is a non-blocking wait-or-fail, not a suspension point).
    pub fn try_acquire(&self, principal_id: &str) -> GatewayResult<()> {
        let now = Utc::now();
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let state = buckets.entry(principal_id.to_string()).or_insert(RateState {
            tokens: f64::from(self.config.burst),
            last_refill: now,
        });

        let elapsed_s = (now - state.last_refill).num_milliseconds().max(0) as f64 / 1000.0;
        let refill_rate = f64::from(self.config.requests_per_minute) / 60.0;
        state.tokens = (state.tokens + elapsed_s * refill_rate).min(f64::from(self.config.burst));
        state.last_refill = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            let retry_after_ms = ((deficit / refill_rate) * 1000.0).ceil().max(0.0) as u64;
            Err(GatewayError::new(ErrorKind::RateLimited, "rate limit exceeded")
                .with_retry_after(retry_after_ms))
        }
    }

    /// Current token balance for `principal_id`, for diagnostics (§system://status).
    #[must_use]
    pub fn tokens_remaining(&self, principal_id: &str) -> f64 {
        self.buckets
            .lock()
            .expect("rate limiter mutex poisoned")
            .get(principal_id)
            .map(|s| s.tokens)
            .unwrap_or(f64::from(self.config.burst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_allows_immediate_consecutive_requests() {
        let limiter = RateLimiter::new(RateLimitConfig { requests_per_minute: 60, burst: 3 });
        assert!(limiter.try_acquire("p1").is_ok());
        assert!(limiter.try_acquire("p1").is_ok());
        assert!(limiter.try_acquire("p1").is_ok());
    }

    #[test]
    fn exhausted_bucket_is_rejected_with_retry_after() {
        let limiter = RateLimiter::new(RateLimitConfig { requests_per_minute: 60, burst: 1 });
        assert!(limiter.try_acquire("p1").is_ok());
        let err = limiter.try_acquire("p1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert!(err.retry_after_ms.unwrap() > 0);
    }

    #[test]
    fn distinct_principals_have_independent_buckets() {
        let limiter = RateLimiter::new(RateLimitConfig { requests_per_minute: 60, burst: 1 });
        assert!(limiter.try_acquire("p1").is_ok());
        assert!(limiter.try_acquire("p2").is_ok());
    }
}
