// SPDX-License-Identifier: MIT OR Apache-2.0
//! Implementations behind each `dgw` subcommand, kept separate from
//! `main.rs` so they can be unit-tested without spawning the binary.

use anyhow::{Context, Result};
use dgw_backend::BackendClient;
use dgw_core::config::{GatewayConfig, WarningSeverity};
use dgw_core::{BackendCallTemplate, HttpMethod};
use dgw_nlp::NlpEngine;
use std::path::Path;

/// Load and validate the config at `path`, printing every warning.
/// Returns `Err` if any warning is startup-fatal.
pub fn validate(path: &Path) -> Result<Vec<String>> {
    let config = dgw_server::config_loader::load(path)
        .with_context(|| format!("loading config from {}", path.display()))?;
    let warnings = config.validate();

    let mut lines = Vec::new();
    let mut fatal = false;
    for warning in &warnings {
        let tag = match warning.severity {
            WarningSeverity::Error => {
                fatal = true;
                "error"
            }
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        lines.push(format!("[{tag}] {}: {}", warning.field, warning.message));
    }

    if fatal {
        anyhow::bail!("configuration failed validation:\n{}", lines.join("\n"));
    }
    Ok(lines)
}

/// Parse `text` with the NLP engine configured by `config`, without
/// touching a live backend.
pub fn parse(config: &GatewayConfig, text: &str) -> Result<serde_json::Value> {
    let engine = NlpEngine::new(config.nlp.confidence_threshold, config.nlp.kanji_numeral_lexicon.clone());
    let intents = engine.parse(text).context("parsing input text")?;
    Ok(serde_json::to_value(intents)?)
}

/// Probe the configured backend with a single `GET /drones` call.
pub async fn health(config: &GatewayConfig) -> Result<serde_json::Value> {
    let client = BackendClient::new(&config.backend).context("building backend client")?;
    let template = BackendCallTemplate { method: HttpMethod::Get, path: "/drones".to_string(), body: None };
    let (result, meta) = client.call(&template, true).await;
    match result {
        Ok(body) => {
            tracing::info!(attempts = meta.total_attempts, "backend reachable");
            Ok(serde_json::json!({
                "reachable": true,
                "attempts": meta.total_attempts,
                "body": body,
            }))
        }
        Err(err) => {
            tracing::warn!(attempts = meta.total_attempts, kind = err.kind.as_str(), "backend unreachable");
            Ok(serde_json::json!({
                "reachable": false,
                "attempts": meta.total_attempts,
                "kind": err.kind.as_str(),
                "message": err.message,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::config::{BackendConfig, MonitoringConfig, NlpConfig, ProtocolConfig, SecurityConfig};

    fn base_config() -> GatewayConfig {
        GatewayConfig {
            backend: BackendConfig {
                base_url: "https://drones.example.test".into(),
                timeout_s: 5,
                max_retries: 1,
                api_key: "k".into(),
            },
            security: SecurityConfig {
                jwt_secret: "x".repeat(32),
                users: vec![],
                rate_limits: Default::default(),
                max_failed_attempts: 5,
                lockout_duration_minutes: 15,
                allowed_ips: vec![],
                blocked_ips: vec![],
                lockout_scope: Default::default(),
            },
            nlp: NlpConfig::default(),
            monitoring: MonitoringConfig::default(),
            protocol: ProtocolConfig::default(),
        }
    }

    #[test]
    fn parse_returns_an_intent_array() {
        let config = base_config();
        let value = parse(&config, "ドローンA1を離陸させて").unwrap();
        assert!(value.is_array());
    }

    #[tokio::test]
    async fn health_reports_unreachable_for_a_dead_backend() {
        let mut config = base_config();
        config.backend.base_url = "http://127.0.0.1:1".to_string();
        let report = health(&config).await.unwrap();
        assert_eq!(report["reachable"], false);
    }
}
