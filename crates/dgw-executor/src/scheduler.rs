// SPDX-License-Identifier: MIT OR Apache-2.0
//! The batch executor (§4.4, C4): drives a [`BatchPlan`] to completion
//! under a bounded concurrency limit, honoring dependency edges, static
//! preconditions, per-principal rate limits, and the batch's
//! [`FailurePolicy`].

use crate::cancel::CancellationToken;
use dgw_backend::BackendClient;
use dgw_core::{
    Action, BatchPlan, Command, ErrorKind, ExecutionResult, ExecutionStatus, FailurePolicy,
    GatewayError,
};
use dgw_router::{check_all, compensating_land, DroneState};
use dgw_security::RateLimiter;
use dgw_telemetry::MetricsRegistry;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::collections::{HashMap, HashSet, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;

/// Shared per-drone state table, read by precondition checks and updated
/// after each successful command. Owned by the caller (`dgw-server`) so it
/// survives across batches within a session.
pub type DroneStates = Arc<Mutex<HashMap<String, DroneState>>>;

/// A fresh, empty drone-state table.
#[must_use]
pub fn new_drone_states() -> DroneStates {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Tunables for the executor's worker pool.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Maximum number of commands dispatched to the backend concurrently.
    /// Default 4, per §4.4.
    pub max_concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Executes [`BatchPlan`]s against a [`BackendClient`], gated by a
/// [`RateLimiter`] and observed through a [`MetricsRegistry`].
pub struct Executor {
    backend: Arc<BackendClient>,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsRegistry>,
    config: ExecutorConfig,
}

impl Executor {
    #[must_use]
    pub fn new(
        backend: Arc<BackendClient>,
        rate_limiter: Arc<RateLimiter>,
        metrics: Arc<MetricsRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self { backend, rate_limiter, metrics, config }
    }

    /// Run every command in `plan` to completion, returning one
    /// [`ExecutionResult`] per command in the plan's original order (§3.1's
    /// invariant: every `Command` produces exactly one result).
    pub async fn execute_batch(
        &self,
        plan: &BatchPlan,
        drone_states: &DroneStates,
        principal_id: &str,
        principal_role: &str,
        cancel: &CancellationToken,
    ) -> Vec<ExecutionResult> {
        let commands_by_id: HashMap<&str, &Command> =
            plan.commands.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut remaining_deps: HashMap<String, HashSet<String>> = plan
            .dependencies
            .iter()
            .map(|(id, deps)| (id.clone(), deps.iter().cloned().collect()))
            .collect();
        for command in &plan.commands {
            remaining_deps.entry(command.id.clone()).or_default();
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for (id, deps) in &remaining_deps {
            for dep in deps {
                dependents.entry(dep.clone()).or_default().push(id.clone());
            }
        }

        let mut ready: VecDeque<String> = remaining_deps
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut in_flight: FuturesUnordered<
            Pin<Box<dyn std::future::Future<Output = (String, ExecutionResult)> + '_>>,
        > = FuturesUnordered::new();
        let mut results: HashMap<String, ExecutionResult> = HashMap::new();
        let mut stop_scheduling = false;

        loop {
            while let Some(id) = ready.pop_front() {
                if stop_scheduling && plan.failure_policy == FailurePolicy::StopOnError {
                    results.insert(id.clone(), skipped_result(&id));
                    continue;
                }
                let command = commands_by_id[id.as_str()];
                let semaphore = semaphore.clone();
                in_flight.push(Box::pin(async move {
                    let permit = semaphore.acquire_owned().await.expect("semaphore closed");
                    let result = self
                        .execute_one(command, drone_states, principal_id, principal_role, cancel)
                        .await;
                    drop(permit);
                    (command.id.clone(), result)
                }));
            }

            let Some((id, result)) = in_flight.next().await else {
                break;
            };
            if result.status != ExecutionStatus::Success {
                stop_scheduling = true;
            }
            results.insert(id.clone(), result);

            if let Some(dependent_ids) = dependents.get(&id) {
                for dependent_id in dependent_ids {
                    if let Some(deps) = remaining_deps.get_mut(dependent_id) {
                        deps.remove(&id);
                        if deps.is_empty() {
                            ready.push_back(dependent_id.clone());
                        }
                    }
                }
            }
        }

        if plan.failure_policy == FailurePolicy::Rollback
            && results.values().any(|r| r.status != ExecutionStatus::Success)
        {
            self.rollback(plan, drone_states, principal_id, principal_role, &mut results).await;
        }

        plan.commands
            .iter()
            .map(|c| results.remove(&c.id).unwrap_or_else(|| skipped_result(&c.id)))
            .collect()
    }

    async fn execute_one(
        &self,
        command: &Command,
        drone_states: &DroneStates,
        principal_id: &str,
        principal_role: &str,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        let started_at = chrono::Utc::now();

        if cancel.is_cancelled() {
            return terminal_result(
                command,
                started_at,
                ExecutionStatus::Skipped,
                None,
                Some(GatewayError::new(ErrorKind::Cancelled, "batch cancelled before dispatch")),
                0,
            );
        }

        let state = command
            .intent
            .parameters
            .target_drone_id
            .as_deref()
            .and_then(|id| {
                drone_states.lock().expect("drone state mutex poisoned").get(id).copied()
            })
            .unwrap_or(DroneState::default());

        if let Err(err) = check_all(command, state) {
            return terminal_result(command, started_at, ExecutionStatus::Failed, None, Some(err), 1);
        }

        if let Err(err) = self.rate_limiter.try_acquire(principal_id) {
            self.metrics.record_rate_limit_rejection(principal_role);
            return terminal_result(command, started_at, ExecutionStatus::Failed, None, Some(err), 1);
        }

        let call_started = Instant::now();
        let (outcome, retry_meta) =
            self.backend.call(&command.backend_call_template, command.idempotent).await;
        let latency_s = call_started.elapsed().as_secs_f64();
        let endpoint = command.backend_call_template.path.clone();

        match outcome {
            Ok(response) => {
                self.metrics.record_backend_request(&endpoint, "success", latency_s);
                self.apply_success(command, drone_states);
                terminal_result(
                    command,
                    started_at,
                    ExecutionStatus::Success,
                    Some(response),
                    None,
                    retry_meta.total_attempts,
                )
            }
            Err(err) => {
                self.metrics.record_backend_request(&endpoint, err.kind.as_str(), latency_s);
                let status = if err.kind == ErrorKind::TimedOut {
                    ExecutionStatus::TimedOut
                } else {
                    ExecutionStatus::Failed
                };
                terminal_result(command, started_at, status, None, Some(err), retry_meta.total_attempts)
            }
        }
    }

    fn apply_success(&self, command: &Command, drone_states: &DroneStates) {
        let Some(drone_id) = command.intent.parameters.target_drone_id.clone() else {
            return;
        };
        let mut states = drone_states.lock().expect("drone state mutex poisoned");
        let state = states.entry(drone_id).or_default();
        match command.intent.action {
            Action::Connect => state.connected = true,
            Action::Disconnect => {
                state.connected = false;
                state.flying = false;
            }
            Action::Takeoff => state.flying = true,
            Action::Land | Action::EmergencyStop => state.flying = false,
            _ => {}
        }
    }

    /// After a failed batch under `FailurePolicy::Rollback`, land every
    /// drone this batch left flying (§4.3's documented rollback subset).
    async fn rollback(
        &self,
        plan: &BatchPlan,
        drone_states: &DroneStates,
        principal_id: &str,
        principal_role: &str,
        results: &mut HashMap<String, ExecutionResult>,
    ) {
        let mut drone_ids: Vec<String> = plan
            .commands
            .iter()
            .filter_map(|c| c.intent.parameters.target_drone_id.clone())
            .collect();
        drone_ids.sort();
        drone_ids.dedup();

        for drone_id in drone_ids {
            let flying = drone_states
                .lock()
                .expect("drone state mutex poisoned")
                .get(&drone_id)
                .map(|s| s.flying)
                .unwrap_or(false);
            if !flying {
                continue;
            }
            let rollback_id = format!("rollback-land-{drone_id}");
            let command = compensating_land(&drone_id, rollback_id.clone());
            let result = self
                .execute_one(
                    &command,
                    drone_states,
                    principal_id,
                    principal_role,
                    &CancellationToken::new(),
                )
                .await;
            results.insert(rollback_id, result);
        }
    }
}

fn terminal_result(
    command: &Command,
    started_at: chrono::DateTime<chrono::Utc>,
    status: ExecutionStatus,
    backend_response: Option<serde_json::Value>,
    error: Option<GatewayError>,
    attempts: u32,
) -> ExecutionResult {
    ExecutionResult {
        command_id: command.id.clone(),
        status,
        started_at,
        finished_at: Some(chrono::Utc::now()),
        backend_response,
        error,
        attempts: attempts.max(1),
    }
}

fn skipped_result(command_id: &str) -> ExecutionResult {
    ExecutionResult {
        command_id: command_id.to_string(),
        status: ExecutionStatus::Skipped,
        started_at: chrono::Utc::now(),
        finished_at: Some(chrono::Utc::now()),
        backend_response: None,
        error: Some(GatewayError::new(
            ErrorKind::Cancelled,
            "skipped after an earlier command failed under stop_on_error",
        )),
        attempts: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::config::{BackendConfig, RateLimitConfig};
    use dgw_core::{Action, BackendCallTemplate, HttpMethod, ParsedIntent, Precondition};
    use dgw_router::build_batch_plan;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn executor(base_url: String) -> Executor {
        let backend_config = BackendConfig {
            base_url,
            timeout_s: 5,
            max_retries: 1,
            api_key: "test-key".to_string(),
        };
        let backend = Arc::new(BackendClient::new(&backend_config).unwrap());
        let rate_limiter =
            Arc::new(RateLimiter::new(RateLimitConfig { requests_per_minute: 6000, burst: 1000 }));
        let metrics = Arc::new(MetricsRegistry::new());
        Executor::new(backend, rate_limiter, metrics, ExecutorConfig::default())
    }

    fn intent(action: Action, drone_id: &str) -> ParsedIntent {
        let mut i = ParsedIntent::new(action, "test");
        i.parameters.target_drone_id = Some(drone_id.to_string());
        i
    }

    #[tokio::test]
    async fn sequential_plan_runs_connect_then_takeoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drones/A1/connect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/drones/A1/takeoff"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let plan = build_batch_plan(
            "b1",
            &[intent(Action::Connect, "A1"), intent(Action::Takeoff, "A1")],
            FailurePolicy::StopOnError,
        )
        .unwrap();

        let exec = executor(server.uri());
        let states = new_drone_states();
        let results = exec
            .execute_batch(&plan, &states, "p1", "operator", &CancellationToken::new())
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == ExecutionStatus::Success));
        assert!(states.lock().unwrap()["A1"].flying);
    }

    #[tokio::test]
    async fn stop_on_error_skips_dependents_of_a_failed_command() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/drones/A1/connect"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let plan = build_batch_plan(
            "b1",
            &[intent(Action::Connect, "A1"), intent(Action::Takeoff, "A1")],
            FailurePolicy::StopOnError,
        )
        .unwrap();

        let exec = executor(server.uri());
        let states = new_drone_states();
        let results = exec
            .execute_batch(&plan, &states, "p1", "operator", &CancellationToken::new())
            .await;

        assert_eq!(results[0].status, ExecutionStatus::Failed);
        assert_eq!(results[1].status, ExecutionStatus::Skipped);
    }

    #[tokio::test]
    async fn precondition_failure_never_reaches_the_backend() {
        let server = MockServer::start().await;
        // No mocks registered: any request would be an unexpected-request panic.
        let exec = executor(server.uri());
        let states = new_drone_states();

        let command = Command {
            id: "c0".into(),
            intent: intent(Action::Takeoff, "A1"),
            preconditions: vec![Precondition::ConnectedNotFlying],
            backend_call_template: BackendCallTemplate {
                method: HttpMethod::Post,
                path: "/drones/A1/takeoff".into(),
                body: None,
            },
            timeout_ms: 5_000,
            idempotent: false,
        };
        let plan = BatchPlan {
            id: "b1".into(),
            commands: vec![command],
            mode: dgw_core::ExecutionMode::Sequential,
            dependencies: Default::default(),
            failure_policy: FailurePolicy::StopOnError,
        };

        let results = exec
            .execute_batch(&plan, &states, "p1", "operator", &CancellationToken::new())
            .await;
        assert_eq!(results[0].status, ExecutionStatus::Failed);
        assert_eq!(results[0].error.as_ref().unwrap().kind, ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn cancelled_token_skips_every_command() {
        let server = MockServer::start().await;
        let exec = executor(server.uri());
        let states = new_drone_states();
        let plan = build_batch_plan(
            "b1",
            &[intent(Action::Connect, "A1")],
            FailurePolicy::Continue,
        )
        .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = exec.execute_batch(&plan, &states, "p1", "operator", &cancel).await;
        assert_eq!(results[0].status, ExecutionStatus::Skipped);
    }
}
