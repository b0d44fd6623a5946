// SPDX-License-Identifier: MIT OR Apache-2.0
//! Exponential backoff with jitter for backend calls (§4.4, §4.7):
//! base 250ms, factor 2, jitter ±20%, max 3 attempts by default, honoring
//! `Retry-After` when the backend supplies one.

use dgw_core::GatewayError;
use std::future::Future;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Retry policy for one backend call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt. `0` disables retries entirely —
    /// used for non-idempotent calls (§9: never auto-retried).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_factor: f64,
}

impl RetryPolicy {
    /// The default idempotent-call policy: base 250ms, factor 2, ±20%
    /// jitter, up to 3 retries.
    #[must_use]
    pub fn idempotent(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.2,
        }
    }

    /// No retries — for non-idempotent calls.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter_factor: 0.2,
        }
    }
}

/// Metadata about the attempts made for one call.
#[derive(Debug, Clone, Default)]
pub struct RetryMetadata {
    pub total_attempts: u32,
    pub total_duration: Duration,
}

/// Exponential backoff delay for a zero-indexed attempt, jittered by
/// `±jitter_factor` using clock-derived pseudo-randomness (this crate has
/// no hard dependency on an RNG for a value this low-stakes).
#[must_use]
pub fn compute_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = 2u64.saturating_pow(attempt);
    let nominal_ms = (policy.base_delay.as_millis() as u64).saturating_mul(exp);
    let capped_ms = nominal_ms.min(policy.max_delay.as_millis() as u64);

    let jitter_factor = policy.jitter_factor.clamp(0.0, 1.0);
    if jitter_factor <= 0.0 || capped_ms == 0 {
        return Duration::from_millis(capped_ms);
    }

    let jitter_range = (capped_ms as f64 * jitter_factor) as u64;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    let pseudo = nanos.wrapping_mul(attempt as u64 + 1);
    let offset = if jitter_range > 0 { pseudo % (2 * jitter_range + 1) } else { 0 };
    // offset in [0, 2*jitter_range]; recenter to [-jitter_range, +jitter_range].
    let signed_offset = offset as i64 - jitter_range as i64;
    Duration::from_millis((capped_ms as i64 + signed_offset).max(0) as u64)
}

/// Run `op` under `policy`, retrying on errors for which `retryable` returns
/// `true`, honoring an explicit `retry_after_ms` on the error (e.g. from a
/// backend `429`) over the computed exponential delay when present.
pub async fn retry_async<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
    retryable: fn(&GatewayError) -> bool,
) -> (Result<T, GatewayError>, RetryMetadata)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let start = Instant::now();
    let max_attempts = policy.max_retries + 1;

    for attempt in 0..max_attempts {
        match op().await {
            Ok(value) => {
                return (
                    Ok(value),
                    RetryMetadata {
                        total_attempts: attempt + 1,
                        total_duration: start.elapsed(),
                    },
                );
            }
            Err(err) => {
                let is_last = attempt + 1 >= max_attempts;
                if !retryable(&err) || is_last {
                    debug!(
                        target: "dgw.backend.retry",
                        kind = err.kind.as_str(),
                        attempt,
                        is_last,
                        "giving up"
                    );
                    return (
                        Err(err),
                        RetryMetadata {
                            total_attempts: attempt + 1,
                            total_duration: start.elapsed(),
                        },
                    );
                }

                let delay = err
                    .retry_after_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| compute_delay(policy, attempt));

                warn!(
                    target: "dgw.backend.retry",
                    kind = err.kind.as_str(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retryable backend error, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    unreachable!("loop always returns on or before the final attempt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry_on_first_try() {
        let policy = RetryPolicy::idempotent(3);
        let calls = AtomicU32::new(0);
        let (result, meta) = retry_async(
            &policy,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, GatewayError>(42) }
            },
            |e| e.kind.is_retryable(),
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(meta.total_attempts, 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_max() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_factor: 0.0,
        };
        let calls = AtomicU32::new(0);
        let (result, meta) = retry_async(
            &policy,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(GatewayError::new(ErrorKind::BackendUnavailable, "down")) }
            },
            |e| e.kind.is_retryable(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(meta.total_attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let policy = RetryPolicy::idempotent(3);
        let calls = AtomicU32::new(0);
        let (result, meta) = retry_async(
            &policy,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(GatewayError::new(ErrorKind::Conflict, "conflict")) }
            },
            |e| e.kind.is_retryable(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(meta.total_attempts, 1);
    }

    #[tokio::test]
    async fn zero_max_retries_makes_exactly_one_attempt() {
        let policy = RetryPolicy::none();
        let calls = AtomicU32::new(0);
        let (result, _) = retry_async(
            &policy,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(GatewayError::new(ErrorKind::BackendUnavailable, "down")) }
            },
            |e| e.kind.is_retryable(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
