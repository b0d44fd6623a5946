// SPDX-License-Identifier: MIT OR Apache-2.0
//! The bounded audit ring buffer (§4.6): a FIFO-evicted store of
//! [`SecurityEvent`]s backing `system://health` and the threat evaluator.

use dgw_core::{config::MonitoringConfig, SecurityEvent};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Fixed-capacity FIFO ring buffer of security events. Once `capacity` is
/// reached, pushing a new event evicts the oldest.
pub struct AuditLog {
    capacity: usize,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl AuditLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            events: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Construct from [`MonitoringConfig::audit_ring_capacity`].
    #[must_use]
    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.audit_ring_capacity)
    }

    /// Append an event, evicting the oldest if at capacity.
    pub fn push(&self, event: SecurityEvent) {
        let mut events = self.events.lock().expect("audit log mutex poisoned");
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent `limit` events, newest last.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("audit log mutex poisoned");
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// All buffered events, newest last. Used by the threat evaluator.
    #[must_use]
    pub fn all(&self) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("audit log mutex poisoned");
        events.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect("audit log mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dgw_core::Severity;
    use std::collections::BTreeMap;

    fn event(kind: &str) -> SecurityEvent {
        SecurityEvent {
            ts: Utc::now(),
            kind: kind.to_string(),
            severity: Severity::Low,
            principal_id: None,
            source_ip: None,
            description: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn push_beyond_capacity_evicts_oldest() {
        let log = AuditLog::new(2);
        log.push(event("a"));
        log.push(event("b"));
        log.push(event("c"));
        let all = log.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, "b");
        assert_eq!(all[1].kind, "c");
    }

    #[test]
    fn recent_returns_newest_last() {
        let log = AuditLog::new(10);
        for k in ["a", "b", "c"] {
            log.push(event(k));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].kind, "c");
    }

    #[test]
    fn empty_log_reports_empty() {
        let log = AuditLog::new(5);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
