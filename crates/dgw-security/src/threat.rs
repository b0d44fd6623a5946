// SPDX-License-Identifier: MIT OR Apache-2.0
//! Periodic threat-analysis evaluator (§4.5): aggregates recent
//! [`SecurityEvent`]s into a summary surfaced via `system://health`. The
//! owning server schedules this on a 30s-default cadence
//! (`monitoring.alert_evaluation_interval_s`); this module only evaluates.

use dgw_core::{Severity, SecurityEvent};
use serde::{Deserialize, Serialize};

/// Aggregate threat summary over a window of [`SecurityEvent`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatSummary {
    pub critical_count: usize,
    pub high_count: usize,
    pub recommendations: Vec<String>,
}

/// Evaluate a batch of security events into a [`ThreatSummary`].
#[must_use]
pub fn evaluate(events: &[SecurityEvent]) -> ThreatSummary {
    let critical_count = events.iter().filter(|e| e.severity == Severity::Critical).count();
    let high_count = events.iter().filter(|e| e.severity == Severity::High).count();

    let locked_out = events.iter().filter(|e| e.kind == "locked_out").count();
    let rate_limited = events.iter().filter(|e| e.kind == "rate_limited").count();
    let unauthorized = events.iter().filter(|e| e.kind == "unauthorized").count();

    let mut recommendations = Vec::new();
    if locked_out >= 3 {
        recommendations.push(format!(
            "{locked_out} lockouts observed — investigate possible credential-stuffing activity"
        ));
    }
    if rate_limited >= 10 {
        recommendations.push(format!(
            "{rate_limited} rate-limit rejections — consider tightening per-principal burst"
        ));
    }
    if unauthorized >= 5 {
        recommendations.push(format!(
            "{unauthorized} unauthorized attempts — review exposed credentials"
        ));
    }
    if critical_count > 0 {
        recommendations.push(format!("{critical_count} critical security events require review"));
    }

    ThreatSummary {
        critical_count,
        high_count,
        recommendations,
    }
}
