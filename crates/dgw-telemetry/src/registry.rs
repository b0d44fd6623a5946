// SPDX-License-Identifier: MIT OR Apache-2.0
//! The metrics registry (§4.6): counters, gauges, and histograms, plus
//! convenience recorders for the eight required named instruments.

use chrono::Utc;
use dgw_core::{MetricKind, MetricSample};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-wide counter/gauge/histogram store. All instruments are
/// eventually-visible across readers (§5); no instrument blocks a writer.
#[derive(Default)]
pub struct MetricsRegistry {
    counters: Mutex<BTreeMap<MetricKeyOrd, f64>>,
    gauges: Mutex<BTreeMap<MetricKeyOrd, f64>>,
    histograms: Mutex<BTreeMap<MetricKeyOrd, Vec<f64>>>,
}

// BTreeMap needs Ord; MetricKey only needs Eq/Hash for HashMap use, but a
// deterministic iteration order makes Prometheus exposition reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct MetricKeyOrd(&'static str, Vec<(String, String)>);

fn key(name: &'static str, labels: &[(&str, &str)]) -> MetricKeyOrd {
    let mut pairs: Vec<(String, String)> =
        labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    pairs.sort();
    MetricKeyOrd(name, pairs)
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn incr_counter(&self, name: &'static str, labels: &[(&str, &str)], value: f64) {
        let mut counters = self.counters.lock().expect("metrics mutex poisoned");
        *counters.entry(key(name, labels)).or_insert(0.0) += value;
    }

    fn set_gauge(&self, name: &'static str, labels: &[(&str, &str)], value: f64) {
        let mut gauges = self.gauges.lock().expect("metrics mutex poisoned");
        gauges.insert(key(name, labels), value);
    }

    fn observe(&self, name: &'static str, labels: &[(&str, &str)], value: f64) {
        let mut histograms = self.histograms.lock().expect("metrics mutex poisoned");
        histograms.entry(key(name, labels)).or_default().push(value);
    }

    /// `rpc_requests_total{method,status}` and `rpc_latency_seconds{method}`.
    pub fn record_rpc_request(&self, method: &str, status: &str, latency_s: f64) {
        self.incr_counter("rpc_requests_total", &[("method", method), ("status", status)], 1.0);
        self.observe("rpc_latency_seconds", &[("method", method)], latency_s);
    }

    /// `nlp_parse_confidence` histogram.
    pub fn record_nlp_confidence(&self, confidence: f64) {
        self.observe("nlp_parse_confidence", &[], confidence);
    }

    /// `backend_requests_total{endpoint,status}` and `backend_latency_seconds{endpoint}`.
    pub fn record_backend_request(&self, endpoint: &str, status: &str, latency_s: f64) {
        self.incr_counter(
            "backend_requests_total",
            &[("endpoint", endpoint), ("status", status)],
            1.0,
        );
        self.observe("backend_latency_seconds", &[("endpoint", endpoint)], latency_s);
    }

    /// `security_events_total{kind,severity}`.
    pub fn record_security_event(&self, kind: &str, severity: &str) {
        self.incr_counter("security_events_total", &[("kind", kind), ("severity", severity)], 1.0);
    }

    /// `active_sessions` gauge.
    pub fn set_active_sessions(&self, count: u64) {
        self.set_gauge("active_sessions", &[], count as f64);
    }

    /// `rate_limit_rejections_total{principal_role}`.
    pub fn record_rate_limit_rejection(&self, principal_role: &str) {
        self.incr_counter("rate_limit_rejections_total", &[("principal_role", principal_role)], 1.0);
    }

    /// Snapshot every instrument as a flat list of [`MetricSample`]s, with
    /// histograms expanded into `_sum`/`_count` samples (bucket-free
    /// summary, per §4.6's invariant on `sum`/`count` monotonicity).
    #[must_use]
    pub fn samples(&self) -> Vec<MetricSample> {
        let now = Utc::now();
        let mut out = Vec::new();

        for (k, v) in self.counters.lock().expect("metrics mutex poisoned").iter() {
            out.push(sample(k, MetricKind::Counter, *v, now));
        }
        for (k, v) in self.gauges.lock().expect("metrics mutex poisoned").iter() {
            out.push(sample(k, MetricKind::Gauge, *v, now));
        }
        for (k, values) in self.histograms.lock().expect("metrics mutex poisoned").iter() {
            let sum: f64 = values.iter().sum();
            out.push(sample_named(
                &format!("{}_sum", k.0),
                &k.1,
                MetricKind::Histogram,
                sum,
                now,
            ));
            out.push(sample_named(
                &format!("{}_count", k.0),
                &k.1,
                MetricKind::Histogram,
                values.len() as f64,
                now,
            ));
        }
        out
    }
}

fn sample(k: &MetricKeyOrd, kind: MetricKind, value: f64, ts: chrono::DateTime<Utc>) -> MetricSample {
    sample_named(k.0, &k.1, kind, value, ts)
}

fn sample_named(
    name: &str,
    labels: &[(String, String)],
    kind: MetricKind,
    value: f64,
    ts: chrono::DateTime<Utc>,
) -> MetricSample {
    MetricSample {
        name: name.to_string(),
        kind,
        labels: labels.iter().cloned().collect(),
        value,
        ts,
    }
}
