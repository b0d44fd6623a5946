// SPDX-License-Identifier: MIT OR Apache-2.0
//! Consecutive-failure lockout (§4.5): N failures within window `W` locks
//! the source for duration `D`. Scope (per-credential, per-source-IP, or
//! both) is configurable via [`dgw_core::config::LockoutScope`] — callers
//! choose which key(s) to check/record based on that setting.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dgw_core::config::SecurityConfig;
use std::collections::HashMap;
use std::sync::Mutex;

/// Sliding failure window: resets if the gap since the last failure exceeds
/// the configured window.
struct FailureWindow {
    count: u32,
    first_failure_at: DateTime<Utc>,
}

/// Tracks consecutive-failure lockouts per key (a credential id, a source
/// IP, or both, depending on [`dgw_core::config::LockoutScope`]).
pub struct LockoutTracker {
    max_failed_attempts: u32,
    /// The failure window matches the lockout duration: failures older
    /// than one lockout period no longer count toward the next lockout.
    window: ChronoDuration,
    lockout_duration: ChronoDuration,
    failures: Mutex<HashMap<String, FailureWindow>>,
    locked_until: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl LockoutTracker {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let lockout_duration = ChronoDuration::minutes(i64::from(config.lockout_duration_minutes));
        Self {
            max_failed_attempts: config.max_failed_attempts,
            window: lockout_duration,
            lockout_duration,
            failures: Mutex::new(HashMap::new()),
            locked_until: Mutex::new(HashMap::new()),
        }
    }

    /// `true` if `key` is currently within a lockout window. Locked sources
    /// are rejected without even attempting credential verification (§4.5).
    pub fn is_locked(&self, key: &str) -> bool {
        let locked_until = self.locked_until.lock().expect("lockout mutex poisoned");
        locked_until.get(key).is_some_and(|until| Utc::now() < *until)
    }

    /// Record an authentication failure for `key`. Returns `true` if this
    /// failure just triggered a lockout.
    pub fn record_failure(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut failures = self.failures.lock().expect("lockout mutex poisoned");
        let entry = failures.entry(key.to_string()).or_insert(FailureWindow {
            count: 0,
            first_failure_at: now,
        });

        if now - entry.first_failure_at > self.window {
            entry.count = 0;
            entry.first_failure_at = now;
        }
        entry.count += 1;

        if entry.count >= self.max_failed_attempts {
            let mut locked_until = self.locked_until.lock().expect("lockout mutex poisoned");
            locked_until.insert(key.to_string(), now + self.lockout_duration);
            entry.count = 0;
            true
        } else {
            false
        }
    }

    /// Clear the failure count for `key` after a successful authentication.
    pub fn record_success(&self, key: &str) {
        self.failures.lock().expect("lockout mutex poisoned").remove(key);
    }
}
