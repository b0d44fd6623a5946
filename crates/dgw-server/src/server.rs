// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `Server` aggregate: owns every component instance and dispatches
//! JSON-RPC requests into them. Wiring is unidirectional — `Server` depends
//! on each component, never the reverse, and no component holds a reference
//! back to `Server` (§9: no singletons, no cyclic refs).

use crate::arguments;
use chrono::Utc;
use dgw_backend::BackendClient;
use dgw_core::config::{GatewayConfig, LockoutScope};
use dgw_core::{
    BatchStatus, ErrorKind, FailurePolicy, GatewayError, GatewayResult, ParsedIntent, Principal, Role,
    SecurityEvent, Severity,
};
use dgw_executor::{new_drone_states, CancellationToken, DroneStates, Executor, ExecutorConfig};
use dgw_nlp::NlpEngine;
use dgw_protocol::{validate_arguments, Catalog, JsonRpcCodec, JsonRpcRequest, JsonRpcResponse, RequestId, ServerState};
use dgw_router::build_batch_plan;
use dgw_security::{authorize, evaluate_threats, sanitize, Authenticator, LockoutTracker, RateLimiter};
use dgw_telemetry::{AlertEngine, AuditLog, MetricsRegistry};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// The single peer session a stdio process serves. Born on a successful
/// `initialize`, lives for the process's lifetime (§4.1: one connection per
/// process over the stdio transport).
struct Session {
    principal: Principal,
    started_at: chrono::DateTime<Utc>,
    request_count: u64,
    last_activity: chrono::DateTime<Utc>,
}

/// Owns every gateway component and dispatches JSON-RPC requests (§4.1, §9).
pub struct Server {
    config: GatewayConfig,
    authenticator: Authenticator,
    lockout: LockoutTracker,
    rate_limiter: Arc<RateLimiter>,
    nlp: NlpEngine,
    executor: Executor,
    metrics: Arc<MetricsRegistry>,
    audit: AuditLog,
    alerts: AlertEngine,
    drone_states: DroneStates,
    state: Mutex<ServerState>,
    session: Mutex<Option<Session>>,
    worker_semaphore: Arc<Semaphore>,
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Readonly => "readonly",
        Role::Operator => "operator",
        Role::Admin => "admin",
        Role::System => "system",
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Med => "med",
        Severity::High => "high",
        Severity::Critical => "critical",
    }
}

fn encode(response: JsonRpcResponse) -> String {
    JsonRpcCodec::encode_response(&response).unwrap_or_else(|_| "{}\n".to_string())
}

impl Server {
    /// Build every component from `config`. Fails if the configuration is
    /// not startup-safe (§6) or the backend HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        if !config.is_startup_safe() {
            let warnings = config.validate();
            return Err(GatewayError::internal(format!(
                "configuration failed validation: {warnings:?}"
            )));
        }

        let authenticator = Authenticator::new(&config.security);
        let lockout = LockoutTracker::new(&config.security);
        let rate_limiter = Arc::new(RateLimiter::new(config.security.rate_limits.clone()));
        let nlp = NlpEngine::new(config.nlp.confidence_threshold, config.nlp.kanji_numeral_lexicon.clone());
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let metrics = Arc::new(MetricsRegistry::new());
        let audit = AuditLog::from_config(&config.monitoring);
        let alerts = AlertEngine::new(AlertEngine::default_rules());
        let drone_states = new_drone_states();
        let executor = Executor::new(
            backend,
            rate_limiter.clone(),
            metrics.clone(),
            ExecutorConfig {
                max_concurrency: config.protocol.worker_pool_size,
            },
        );
        let worker_semaphore = Arc::new(Semaphore::new(config.protocol.worker_pool_size));

        Ok(Self {
            config,
            authenticator,
            lockout,
            rate_limiter,
            nlp,
            executor,
            metrics,
            audit,
            alerts,
            drone_states,
            state: Mutex::new(ServerState::Created),
            session: Mutex::new(None),
            worker_semaphore,
        })
    }

    /// `true` once [`ServerState::Closed`] has been reached — the main loop
    /// uses this to stop reading from stdin.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.current_state() == ServerState::Closed
    }

    /// Idle timeout configured for this server, for the main loop's
    /// read-with-timeout wrapper (§4.1).
    #[must_use]
    pub fn idle_timeout_s(&self) -> u32 {
        self.config.protocol.idle_timeout_s
    }

    /// Periodically evaluate alert rules against the latest metrics
    /// snapshot, logging any that are `Firing`. Runs on
    /// `monitoring.alert_evaluation_interval_s` (default 30s) until the
    /// server reaches `Closed` (§4.6).
    pub async fn run_monitoring_loop(self: Arc<Self>) {
        if !self.config.monitoring.enabled {
            return;
        }
        let interval_s = self.config.monitoring.alert_evaluation_interval_s.max(1);
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(u64::from(interval_s)));
        loop {
            ticker.tick().await;
            if self.is_closed() {
                break;
            }
            let alerts = self.alerts.evaluate(&self.metrics.samples());
            for alert in alerts.into_iter().filter(|a| a.state == dgw_telemetry::AlertState::Firing) {
                warn!(
                    rule = %alert.rule_name,
                    severity = ?alert.severity,
                    value = alert.value,
                    "alert firing"
                );
            }
        }
    }

    /// Decode one input line, dispatch it, and encode the reply. Returns
    /// `None` for notifications (no `id`), which never produce a response.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let request = match JsonRpcCodec::decode_request(line) {
            Ok(request) => request,
            Err(err) => return Some(encode(JsonRpcResponse::failure(RequestId::Null, &err))),
        };

        let id = request.id.clone().unwrap_or(RequestId::Null);
        let is_notification = request.is_notification();
        let result = self.dispatch(&request).await;

        if is_notification {
            if let Err(err) = result {
                warn!(method = %request.method, error = %err, "notification handling failed");
            }
            return None;
        }

        Some(match result {
            Ok(value) => encode(JsonRpcResponse::success(id, value)),
            Err(err) => encode(JsonRpcResponse::failure(id, &err)),
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> GatewayResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params).await,
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(&request.params),
            "shutdown" => self.handle_shutdown(),
            other => Err(GatewayError::method_not_found(other)),
        }
    }

    fn current_state(&self) -> ServerState {
        *self.state.lock().expect("state mutex poisoned")
    }

    fn transition(&self, next: ServerState) -> GatewayResult<()> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if !state.can_transition_to(next) {
            return Err(GatewayError::internal(format!(
                "invalid lifecycle transition: {state:?} -> {next:?}"
            )));
        }
        *state = next;
        Ok(())
    }

    fn lockout_key(&self, raw_credential: &str) -> String {
        match self.config.security.lockout_scope {
            LockoutScope::CredentialId => format!("cred:{raw_credential}"),
            LockoutScope::SourceIp => "stdio:local".to_string(),
            LockoutScope::Both => format!("cred:{raw_credential}|stdio:local"),
        }
    }

    /// Resolve the principal for one `tools/call`/`resources/read` request.
    /// §6: authentication material may be carried in `params._auth` *or* the
    /// out-of-band `initialize` handshake, and both MUST be supported — so a
    /// per-request `_auth` credential, when present, authenticates a
    /// principal scoped to this call instead of falling back to the
    /// session's principal from `initialize`.
    fn resolve_principal(&self, session_principal: Principal, params: &Value) -> GatewayResult<Principal> {
        let Some(credential) = params.get("_auth").and_then(Value::as_str) else {
            return Ok(session_principal);
        };

        let lockout_key = self.lockout_key(credential);
        if self.lockout.is_locked(&lockout_key) {
            self.record_security_event("locked_out", Severity::High, None);
            return Err(GatewayError::new(
                ErrorKind::LockedOut,
                "too many failed attempts; try again later",
            ));
        }

        match self.authenticator.authenticate(credential) {
            Ok(principal) => {
                self.lockout.record_success(&lockout_key);
                Ok(principal)
            }
            Err(err) => {
                let triggered_lockout = self.lockout.record_failure(&lockout_key);
                self.record_security_event("unauthorized", Severity::Med, None);
                if triggered_lockout {
                    self.record_security_event("locked_out", Severity::High, None);
                }
                Err(err)
            }
        }
    }

    fn record_security_event(&self, kind: &str, severity: Severity, principal_id: Option<String>) {
        self.metrics.record_security_event(kind, severity_label(severity));
        self.audit.push(SecurityEvent {
            ts: Utc::now(),
            kind: kind.to_string(),
            severity,
            principal_id,
            source_ip: None,
            description: kind.to_string(),
            attributes: Default::default(),
        });
    }

    /// Validate that the session is `Serving` and has an active principal,
    /// bumping that session's activity counters. This is the one checkpoint
    /// every `tools/*`/`resources/*` handler passes through.
    fn require_serving(&self) -> GatewayResult<Principal> {
        match self.current_state() {
            ServerState::Serving => {}
            ServerState::Created | ServerState::Initialized => {
                return Err(GatewayError::new(ErrorKind::NotInitialized, "call initialize first"))
            }
            ServerState::Draining | ServerState::Closed => {
                return Err(GatewayError::new(ErrorKind::ShuttingDown, "server is shutting down"))
            }
        }

        let mut session = self.session.lock().expect("session mutex poisoned");
        let session = session
            .as_mut()
            .ok_or_else(|| GatewayError::new(ErrorKind::NotInitialized, "no active session"))?;
        session.request_count += 1;
        session.last_activity = Utc::now();
        Ok(session.principal.clone())
    }

    async fn handle_initialize(&self, params: &Value) -> GatewayResult<Value> {
        if self.current_state() != ServerState::Created {
            return Err(GatewayError::internal("initialize has already been called"));
        }

        let credential = params
            .get("credential")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::new(ErrorKind::InvalidParams, "initialize requires a credential"))?;

        let lockout_key = self.lockout_key(credential);
        if self.lockout.is_locked(&lockout_key) {
            self.record_security_event("locked_out", Severity::High, None);
            return Err(GatewayError::new(
                ErrorKind::LockedOut,
                "too many failed attempts; try again later",
            ));
        }

        let principal = match self.authenticator.authenticate(credential) {
            Ok(principal) => principal,
            Err(err) => {
                let triggered_lockout = self.lockout.record_failure(&lockout_key);
                self.record_security_event("unauthorized", Severity::Med, None);
                if triggered_lockout {
                    self.record_security_event("locked_out", Severity::High, None);
                }
                return Err(err);
            }
        };
        self.lockout.record_success(&lockout_key);

        let now = Utc::now();
        *self.session.lock().expect("session mutex poisoned") = Some(Session {
            principal: principal.clone(),
            started_at: now,
            request_count: 0,
            last_activity: now,
        });
        self.metrics.set_active_sessions(1);
        info!(principal_id = %principal.id, role = ?principal.role, "session initialized");

        self.transition(ServerState::Initialized)?;
        self.transition(ServerState::Serving)?;

        Ok(serde_json::json!({
            "protocol_version": dgw_core::CONTRACT_VERSION,
            "server_state": "serving",
            "principal": { "id": principal.id, "role": principal.role },
        }))
    }

    fn handle_tools_list(&self) -> GatewayResult<Value> {
        let principal = self.require_serving()?;
        let tools: Vec<Value> = Catalog::tools()
            .iter()
            .filter(|tool| principal.role.satisfies(tool.min_role))
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "input_schema": tool.input_schema,
                    "min_role": tool.min_role,
                })
            })
            .collect();
        Ok(serde_json::json!({ "tools": tools }))
    }

    fn handle_resources_list(&self) -> GatewayResult<Value> {
        let principal = self.require_serving()?;
        let resources: Vec<Value> = Catalog::resources()
            .iter()
            .filter(|resource| principal.role.satisfies(resource.min_role))
            .map(|resource| {
                serde_json::json!({
                    "uri": resource.uri,
                    "name": resource.name,
                    "description": resource.description,
                    "min_role": resource.min_role,
                })
            })
            .collect();
        Ok(serde_json::json!({ "resources": resources }))
    }

    fn handle_resources_read(&self, params: &Value) -> GatewayResult<Value> {
        let session_principal = self.require_serving()?;
        let principal = self.resolve_principal(session_principal, params)?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::new(ErrorKind::InvalidParams, "resources/read requires a uri"))?;
        let descriptor = Catalog::resource(uri)
            .ok_or_else(|| GatewayError::new(ErrorKind::InvalidParams, format!("unknown resource: {uri}")))?;
        authorize(principal.role, descriptor.min_role)?;

        match uri {
            "drones://list" => {
                let states = self.drone_states.lock().expect("drone state mutex poisoned");
                let drones: Vec<Value> = states
                    .iter()
                    .map(|(id, state)| {
                        serde_json::json!({
                            "drone_id": id,
                            "connected": state.connected,
                            "flying": state.flying,
                        })
                    })
                    .collect();
                Ok(serde_json::json!({ "drones": drones }))
            }
            "system://status" => {
                let session = self.session.lock().expect("session mutex poisoned");
                let session_info = session.as_ref().map(|s| {
                    serde_json::json!({
                        "started_at": s.started_at,
                        "request_count": s.request_count,
                        "last_activity": s.last_activity,
                    })
                });
                Ok(serde_json::json!({
                    "server_state": format!("{:?}", self.current_state()),
                    "session": session_info,
                    "rate_limit_tokens_remaining": self.rate_limiter.tokens_remaining(&principal.id),
                    "metrics": self.metrics.samples(),
                }))
            }
            "system://health" => {
                let events = self.audit.all();
                let summary = evaluate_threats(&events);
                let alerts = self.alerts.evaluate(&self.metrics.samples());
                Ok(serde_json::json!({
                    "server_state": format!("{:?}", self.current_state()),
                    "audit_event_count": events.len(),
                    "threat_summary": summary,
                    "alerts": alerts,
                }))
            }
            "metrics://prometheus" => Ok(serde_json::json!({
                "text": dgw_telemetry::render_prometheus(&self.metrics.samples()),
            })),
            other => Err(GatewayError::new(ErrorKind::InvalidParams, format!("unhandled resource: {other}"))),
        }
    }

    async fn handle_tools_call(&self, params: &Value) -> GatewayResult<Value> {
        let session_principal = self.require_serving()?;
        let principal = self.resolve_principal(session_principal, params)?;

        let _permit = self
            .worker_semaphore
            .clone()
            .try_acquire_owned()
            .map_err(|_| GatewayError::new(ErrorKind::Overloaded, "worker pool exhausted; retry shortly"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::new(ErrorKind::InvalidParams, "tools/call requires a name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| serde_json::json!({}));

        let tool = Catalog::tool(name).ok_or_else(|| GatewayError::method_not_found(name))?;
        authorize(principal.role, tool.min_role)?;
        validate_arguments(&tool.input_schema, &arguments)?;

        // Rate limiting happens per-command inside `Executor::execute_one` —
        // a multi-intent natural-language batch consumes one token per
        // backend call, not one per `tools/call`.
        let intents = if name == "execute_natural_language_command" {
            self.intents_from_natural_language(&principal, &arguments)?
        } else {
            vec![arguments::intent_for_tool(name, &arguments)?]
        };

        let batch_id = uuid::Uuid::new_v4().to_string();
        let plan = build_batch_plan(batch_id, &intents, FailurePolicy::StopOnError)?;

        let cancel = CancellationToken::new();
        let results = self
            .executor
            .execute_batch(&plan, &self.drone_states, &principal.id, role_label(principal.role), &cancel)
            .await;

        let status = BatchStatus::aggregate(&results);
        Ok(serde_json::json!({
            "batch_id": plan.id,
            "status": status,
            "results": results,
        }))
    }

    fn intents_from_natural_language(
        &self,
        principal: &Principal,
        arguments: &Value,
    ) -> GatewayResult<Vec<ParsedIntent>> {
        let text = arguments
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::new(ErrorKind::InvalidParams, "text is required"))?;

        let (ok, cleaned) = sanitize(text);
        if !ok {
            self.record_security_event("input_rejected", Severity::Med, Some(principal.id.clone()));
            return Err(GatewayError::new(ErrorKind::InvalidArgument, "input failed sanitization"));
        }

        let mut parsed = self.nlp.parse_checked(&cleaned)?;
        if let Some(drone_id) = arguments.get("drone_id").and_then(Value::as_str) {
            for intent in &mut parsed {
                intent.parameters.target_drone_id.get_or_insert_with(|| drone_id.to_string());
            }
        }
        for intent in &parsed {
            self.metrics.record_nlp_confidence(intent.confidence);
        }
        Ok(parsed)
    }

    fn handle_shutdown(&self) -> GatewayResult<Value> {
        let principal = self.require_serving()?;
        authorize(principal.role, Role::Admin)?;
        self.transition(ServerState::Draining)?;
        self.transition(ServerState::Closed)?;
        self.metrics.set_active_sessions(0);
        info!(principal_id = %principal.id, "server shutting down");
        Ok(serde_json::json!({ "server_state": "closed" }))
    }
}
