// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed configuration surface (§6) plus validation, grounded on the
//! teacher's `ConfigValidator`/`ConfigDefaults` split: defaults fill in
//! optional fields, `validate()` flags the remainder.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Backend HTTP client configuration (C1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "BackendConfig::default_timeout_s")]
    pub timeout_s: u32,
    #[serde(default = "BackendConfig::default_max_retries")]
    pub max_retries: u32,
    pub api_key: String,
}

impl BackendConfig {
    fn default_timeout_s() -> u32 {
        30
    }
    fn default_max_retries() -> u32 {
        3
    }
}

/// One statically-configured user credential (§6 `security.users[*]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredential {
    pub id: String,
    pub role: crate::model::Role,
    /// Either an API key (`credential_kind = "api_key"`) or, for JWT users,
    /// the `sub` claim value that must match.
    pub credential: String,
}

/// Rate-limit knobs (§4.5 token bucket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "RateLimitConfig::default_rpm")]
    pub requests_per_minute: u32,
    #[serde(default = "RateLimitConfig::default_burst")]
    pub burst: u32,
}

impl RateLimitConfig {
    fn default_rpm() -> u32 {
        60
    }
    fn default_burst() -> u32 {
        10
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: Self::default_rpm(),
            burst: Self::default_burst(),
        }
    }
}

/// Security core configuration (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret. Must be ≥ 32 bytes; checked by [`GatewayConfig::validate`].
    pub jwt_secret: String,
    pub users: Vec<UserCredential>,
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    #[serde(default = "SecurityConfig::default_max_failed_attempts")]
    pub max_failed_attempts: u32,
    #[serde(default = "SecurityConfig::default_lockout_minutes")]
    pub lockout_duration_minutes: u32,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default)]
    pub blocked_ips: Vec<String>,
    /// Whether lockout is keyed by source IP, credential id, or both.
    #[serde(default)]
    pub lockout_scope: LockoutScope,
}

impl SecurityConfig {
    fn default_max_failed_attempts() -> u32 {
        5
    }
    fn default_lockout_minutes() -> u32 {
        15
    }
}

/// Resolves Open Question 4 (§9): lockout scope is configurable rather
/// than hard-coded to one identifier kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockoutScope {
    SourceIp,
    CredentialId,
    #[default]
    Both,
}

/// NLP engine configuration (C2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    #[serde(default = "NlpConfig::default_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "NlpConfig::default_language")]
    pub default_language: String,
    /// Resolves Open Question 2 (§9): the kanji-numeral lexicon is
    /// configurable, not hard-coded. Maps kanji digit strings to their
    /// numeric value, e.g. `"一"` → `1`.
    #[serde(default)]
    pub kanji_numeral_lexicon: std::collections::BTreeMap<String, u32>,
}

impl NlpConfig {
    fn default_threshold() -> f64 {
        0.7
    }
    fn default_language() -> String {
        "ja".to_string()
    }
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: Self::default_threshold(),
            default_language: Self::default_language(),
            kanji_numeral_lexicon: crate::nlp_defaults::default_kanji_lexicon(),
        }
    }
}

/// Monitoring core configuration (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "MonitoringConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "MonitoringConfig::default_retention_hours")]
    pub retention_hours: u32,
    #[serde(default = "MonitoringConfig::default_alert_interval_s")]
    pub alert_evaluation_interval_s: u32,
    #[serde(default = "MonitoringConfig::default_audit_capacity")]
    pub audit_ring_capacity: usize,
}

impl MonitoringConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_retention_hours() -> u32 {
        24
    }
    fn default_alert_interval_s() -> u32 {
        30
    }
    fn default_audit_capacity() -> usize {
        10_000
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            retention_hours: Self::default_retention_hours(),
            alert_evaluation_interval_s: Self::default_alert_interval_s(),
            audit_ring_capacity: Self::default_audit_capacity(),
        }
    }
}

/// Protocol server configuration (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "ProtocolConfig::default_frame_max_bytes")]
    pub frame_max_bytes: usize,
    #[serde(default = "ProtocolConfig::default_idle_timeout_s")]
    pub idle_timeout_s: u32,
    #[serde(default = "ProtocolConfig::default_worker_pool_size")]
    pub worker_pool_size: usize,
}

impl ProtocolConfig {
    fn default_frame_max_bytes() -> usize {
        4096
    }
    fn default_idle_timeout_s() -> u32 {
        300
    }
    fn default_worker_pool_size() -> usize {
        4
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            frame_max_bytes: Self::default_frame_max_bytes(),
            idle_timeout_s: Self::default_idle_timeout_s(),
            worker_pool_size: Self::default_worker_pool_size(),
        }
    }
}

/// The complete gateway configuration, deserialized from a TOML file with
/// environment-variable overrides layered on top by `dgw-server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub backend: BackendConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub nlp: NlpConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Severity level for a configuration warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

/// A single configuration warning produced by [`GatewayConfig::validate`].
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ConfigWarning {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: WarningSeverity::Error,
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: WarningSeverity::Warning,
        }
    }
}

impl GatewayConfig {
    /// Validate the configuration, returning every detected issue.
    ///
    /// Issues with [`WarningSeverity::Error`] in `security.jwt_secret` or
    /// `security.users` are startup-fatal per §6; the caller (`dgw-server`)
    /// decides whether to abort on any `Error`-severity entry.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.security.jwt_secret.as_bytes().len() < 32 {
            warnings.push(ConfigWarning::error(
                "security.jwt_secret",
                "jwt_secret must be at least 32 bytes",
            ));
        }

        if self.security.users.is_empty() {
            warnings.push(ConfigWarning::error(
                "security.users",
                "at least one user must be configured",
            ));
        }

        {
            let mut seen = HashSet::new();
            for user in &self.security.users {
                if !seen.insert(user.id.as_str()) {
                    warnings.push(ConfigWarning::warning(
                        "security.users",
                        format!("duplicate user id: {}", user.id),
                    ));
                }
            }
        }

        if self.backend.base_url.trim().is_empty() {
            warnings.push(ConfigWarning::error(
                "backend.base_url",
                "base_url must not be empty",
            ));
        }
        if self.backend.timeout_s < 1 {
            warnings.push(ConfigWarning::error(
                "backend.timeout_s",
                "timeout_s must be >= 1",
            ));
        }
        if self.backend.max_retries > 10 {
            warnings.push(ConfigWarning::warning(
                "backend.max_retries",
                "max_retries above 10 is unusually high",
            ));
        }

        if !(0.0..=1.0).contains(&self.nlp.confidence_threshold) {
            warnings.push(ConfigWarning::error(
                "nlp.confidence_threshold",
                "confidence_threshold must be in [0, 1]",
            ));
        }

        if self.protocol.frame_max_bytes == 0 {
            warnings.push(ConfigWarning::error(
                "protocol.frame_max_bytes",
                "frame_max_bytes must be greater than 0",
            ));
        }
        if self.protocol.worker_pool_size == 0 {
            warnings.push(ConfigWarning::error(
                "protocol.worker_pool_size",
                "worker_pool_size must be greater than 0",
            ));
        }

        warnings
    }

    /// `true` if [`GatewayConfig::validate`] produced no `Error`-severity warnings.
    #[must_use]
    pub fn is_startup_safe(&self) -> bool {
        !self
            .validate()
            .iter()
            .any(|w| w.severity == WarningSeverity::Error)
    }
}
