// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prometheus text exposition format (§4.6), serving the
//! `metrics://prometheus` resource.

use dgw_core::{MetricKind, MetricSample};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Render a snapshot of [`MetricSample`]s in Prometheus's text exposition
/// format (one `# TYPE` line per distinct metric name, then one sample line
/// per label combination).
#[must_use]
pub fn render(samples: &[MetricSample]) -> String {
    let mut by_name: BTreeMap<&str, (MetricKind, Vec<&MetricSample>)> = BTreeMap::new();
    for sample in samples {
        by_name
            .entry(sample.name.as_str())
            .or_insert_with(|| (sample.kind, Vec::new()))
            .1
            .push(sample);
    }

    let mut out = String::new();
    for (name, (kind, entries)) in by_name {
        let _ = writeln!(out, "# TYPE {name} {}", type_name(kind));
        for sample in entries {
            let _ = writeln!(out, "{name}{} {}", render_labels(&sample.labels), sample.value);
        }
    }
    out
}

fn type_name(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Counter => "counter",
        MetricKind::Gauge => "gauge",
        MetricKind::Histogram => "untyped",
    }
}

fn render_labels(labels: &BTreeMap<String, String>) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape(v)))
        .collect();
    format!("{{{}}}", rendered.join(","))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(name: &str, kind: MetricKind, labels: &[(&str, &str)], value: f64) -> MetricSample {
        MetricSample {
            name: name.to_string(),
            kind,
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            value,
            ts: Utc::now(),
        }
    }

    #[test]
    fn renders_type_line_and_value_line() {
        let samples = vec![sample("active_sessions", MetricKind::Gauge, &[], 3.0)];
        let text = render(&samples);
        assert!(text.contains("# TYPE active_sessions gauge"));
        assert!(text.contains("active_sessions 3"));
    }

    #[test]
    fn renders_labels_in_braces() {
        let samples = vec![sample(
            "rpc_requests_total",
            MetricKind::Counter,
            &[("method", "tools/call"), ("status", "ok")],
            5.0,
        )];
        let text = render(&samples);
        assert!(text.contains("rpc_requests_total{method=\"tools/call\",status=\"ok\"} 5"));
    }

    #[test]
    fn escapes_quotes_and_backslashes_in_label_values() {
        let samples = vec![sample("x", MetricKind::Counter, &[("k", "a\"b\\c")], 1.0)];
        let text = render(&samples);
        assert!(text.contains(r#"k="a\"b\\c""#));
    }

    #[test]
    fn groups_same_name_samples_under_one_type_line() {
        let samples = vec![
            sample("backend_requests_total", MetricKind::Counter, &[("endpoint", "a")], 1.0),
            sample("backend_requests_total", MetricKind::Counter, &[("endpoint", "b")], 2.0),
        ];
        let text = render(&samples);
        assert_eq!(text.matches("# TYPE backend_requests_total").count(), 1);
    }
}
