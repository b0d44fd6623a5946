// SPDX-License-Identifier: MIT OR Apache-2.0
//! Alert rule evaluation (§4.6): threshold rules over [`MetricSample`]
//! snapshots, tracked through a pending → firing → resolved lifecycle so a
//! single noisy sample does not flap an alert into existence and back out.

use chrono::{DateTime, Utc};
use dgw_core::{MetricSample, Severity};
use serde::Serialize;
use std::sync::Mutex;

/// A comparison a rule's threshold is checked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

/// A single alert rule: "when `metric_name`'s latest value compares to
/// `threshold` as `comparison`, for at least `for_evaluations` consecutive
/// evaluation rounds, fire at `severity`."
#[derive(Debug, Clone, Serialize)]
pub struct AlertRule {
    pub name: String,
    pub metric_name: String,
    pub comparison: Comparison,
    pub threshold: f64,
    pub for_evaluations: u32,
    pub severity: Severity,
}

/// Lifecycle state of a tracked rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Pending,
    Firing,
    Resolved,
}

/// A point-in-time observation of an [`AlertRule`]'s status, returned from
/// each evaluation round.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub rule_name: String,
    pub state: AlertState,
    pub severity: Severity,
    pub value: f64,
    pub since: DateTime<Utc>,
}

struct TrackedRule {
    rule: AlertRule,
    consecutive_breaches: u32,
    state: AlertState,
    since: DateTime<Utc>,
}

/// Evaluates a fixed set of [`AlertRule`]s against successive
/// [`MetricSample`] snapshots, owning each rule's pending/firing/resolved
/// state between calls. The owning server calls [`AlertEngine::evaluate`]
/// on the `monitoring.alert_evaluation_interval_s` cadence.
pub struct AlertEngine {
    rules: Mutex<Vec<TrackedRule>>,
}

impl AlertEngine {
    #[must_use]
    pub fn new(rules: Vec<AlertRule>) -> Self {
        let now = Utc::now();
        let tracked = rules
            .into_iter()
            .map(|rule| TrackedRule {
                rule,
                consecutive_breaches: 0,
                state: AlertState::Resolved,
                since: now,
            })
            .collect();
        Self { rules: Mutex::new(tracked) }
    }

    /// The eight-instrument default rule set: latency, confidence, and
    /// security-event thresholds aligned with spec §4.6's recommended
    /// defaults.
    #[must_use]
    pub fn default_rules() -> Vec<AlertRule> {
        vec![
            AlertRule {
                name: "high_rpc_latency".to_string(),
                metric_name: "rpc_latency_seconds_sum".to_string(),
                comparison: Comparison::GreaterThan,
                threshold: 2.0,
                for_evaluations: 3,
                severity: Severity::Med,
            },
            AlertRule {
                name: "high_backend_latency".to_string(),
                metric_name: "backend_latency_seconds_sum".to_string(),
                comparison: Comparison::GreaterThan,
                threshold: 5.0,
                for_evaluations: 3,
                severity: Severity::High,
            },
            AlertRule {
                name: "elevated_rate_limit_rejections".to_string(),
                metric_name: "rate_limit_rejections_total".to_string(),
                comparison: Comparison::GreaterThan,
                threshold: 10.0,
                for_evaluations: 1,
                severity: Severity::Med,
            },
        ]
    }

    /// Evaluate every rule against `samples`, returning the current
    /// [`Alert`] for each. A rule transitions Resolved → Pending on first
    /// breach, Pending → Firing once `for_evaluations` consecutive breaches
    /// accumulate, and Firing/Pending → Resolved immediately the value
    /// stops breaching.
    pub fn evaluate(&self, samples: &[MetricSample]) -> Vec<Alert> {
        let now = Utc::now();
        let mut rules = self.rules.lock().expect("alert engine mutex poisoned");
        rules
            .iter_mut()
            .map(|tracked| {
                let value = samples
                    .iter()
                    .find(|s| s.name == tracked.rule.metric_name)
                    .map(|s| s.value)
                    .unwrap_or(0.0);
                let breached = match tracked.rule.comparison {
                    Comparison::GreaterThan => value > tracked.rule.threshold,
                    Comparison::LessThan => value < tracked.rule.threshold,
                };

                if breached {
                    tracked.consecutive_breaches += 1;
                    let next_state = if tracked.consecutive_breaches >= tracked.rule.for_evaluations
                    {
                        AlertState::Firing
                    } else {
                        AlertState::Pending
                    };
                    if next_state != tracked.state {
                        tracked.since = now;
                    }
                    tracked.state = next_state;
                } else {
                    tracked.consecutive_breaches = 0;
                    if tracked.state != AlertState::Resolved {
                        tracked.since = now;
                    }
                    tracked.state = AlertState::Resolved;
                }

                Alert {
                    rule_name: tracked.rule.name.clone(),
                    state: tracked.state,
                    severity: tracked.rule.severity,
                    value,
                    since: tracked.since,
                }
            })
            .collect()
    }
}

#[cfg(test)]
fn rule_index(rules: &[AlertRule], name: &str) -> Option<usize> {
    rules.iter().position(|r| r.name == name)
}
