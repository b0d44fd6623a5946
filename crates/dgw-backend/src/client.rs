// SPDX-License-Identifier: MIT OR Apache-2.0
//! The backend HTTP client (§4.7, C1): single base URL, bearer auth,
//! connect+total timeouts, retry-on-idempotent, status-taxonomy mapping.

use crate::retry::{retry_async, RetryMetadata, RetryPolicy};
use crate::status::map_status;
use dgw_core::config::BackendConfig;
use dgw_core::{BackendCallTemplate, ErrorKind, GatewayError, GatewayResult, HttpMethod};
use reqwest::Client;
use std::time::Duration;

/// Typed client for the drone-fleet backend API.
pub struct BackendClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl BackendClient {
    /// Build a client from [`BackendConfig`]. Connect and total timeouts
    /// both default to 30s (§6).
    pub fn new(config: &BackendConfig) -> GatewayResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_s))
            .timeout(Duration::from_secs(config.timeout_s))
            .build()
            .map_err(|e| GatewayError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Invoke one resolved backend call. Retries only when `idempotent` is
    /// `true` (§9: non-idempotent commands are never auto-retried), and
    /// honors a `Retry-After` header on `429` responses.
    pub async fn call(
        &self,
        template: &BackendCallTemplate,
        idempotent: bool,
    ) -> (GatewayResult<serde_json::Value>, RetryMetadata) {
        let policy = if idempotent {
            RetryPolicy::idempotent(self.max_retries)
        } else {
            RetryPolicy::none()
        };

        retry_async(
            &policy,
            || self.call_once(template),
            |e| e.kind.is_retryable() || (e.kind == ErrorKind::RateLimited && e.retry_after_ms.is_some()),
        )
        .await
    }

    async fn call_once(&self, template: &BackendCallTemplate) -> GatewayResult<serde_json::Value> {
        let url = format!("{}{}", self.base_url, template.path);
        let mut request = match template.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        }
        .bearer_auth(&self.api_key);

        if let Some(body) = &template.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            GatewayError::new(ErrorKind::BackendUnavailable, format!("request failed: {e}"))
                .with_recoverable(true)
        })?;

        let status = response.status();
        if let Some(kind) = map_status(status) {
            let retry_after_ms = (status.as_u16() == 429)
                .then(|| {
                    response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .map(|secs| secs * 1000)
                })
                .flatten();

            let body_text = response.text().await.unwrap_or_default();
            let mut err = GatewayError::new(
                kind,
                format!("backend returned {status}: {}", truncate(&body_text, 200)),
            );
            if let Some(ms) = retry_after_ms {
                err = err.with_retry_after(ms);
            } else if kind.is_retryable() {
                err = err.with_recoverable(true);
            }
            return Err(err);
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| GatewayError::internal(format!("failed to decode backend response: {e}")))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        &s[..max]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::config::BackendConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> BackendConfig {
        BackendConfig {
            base_url,
            timeout_s: 5,
            max_retries: 2,
            api_key: "test-key".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_call_decodes_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drones/A1/takeoff"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = BackendClient::new(&config(server.uri())).unwrap();
        let template = BackendCallTemplate {
            method: HttpMethod::Post,
            path: "/drones/A1/takeoff".into(),
            body: None,
        };
        let (result, meta) = client.call(&template, false).await;
        assert_eq!(result.unwrap()["ok"], serde_json::json!(true));
        assert_eq!(meta.total_attempts, 1);
    }

    #[tokio::test]
    async fn not_found_maps_to_not_found_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drones/ghost/status"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = BackendClient::new(&config(server.uri())).unwrap();
        let template = BackendCallTemplate {
            method: HttpMethod::Get,
            path: "/drones/ghost/status".into(),
            body: None,
        };
        let (result, _) = client.call(&template, true).await;
        assert_eq!(result.unwrap_err().kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn idempotent_call_retries_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drones"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = BackendClient::new(&config(server.uri())).unwrap();
        let template = BackendCallTemplate {
            method: HttpMethod::Get,
            path: "/drones".into(),
            body: None,
        };
        let (result, meta) = client.call(&template, true).await;
        assert!(result.is_ok());
        assert_eq!(meta.total_attempts, 3);
    }

    #[tokio::test]
    async fn non_idempotent_call_never_retries_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drones/A1/move"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = BackendClient::new(&config(server.uri())).unwrap();
        let template = BackendCallTemplate {
            method: HttpMethod::Post,
            path: "/drones/A1/move".into(),
            body: None,
        };
        let (result, meta) = client.call(&template, false).await;
        assert!(result.is_err());
        assert_eq!(meta.total_attempts, 1);
    }

    #[tokio::test]
    async fn rate_limited_response_carries_retry_after_ms() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drones"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let client = BackendClient::new(&config(server.uri())).unwrap();
        let template = BackendCallTemplate {
            method: HttpMethod::Get,
            path: "/drones".into(),
            body: None,
        };
        let (result, _) = client.call(&template, false).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.retry_after_ms, Some(2000));
    }
}
