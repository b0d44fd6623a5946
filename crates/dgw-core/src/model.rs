// SPDX-License-Identifier: MIT OR Apache-2.0
//! Core data model: `ParsedIntent` → `Command` → `BatchPlan` → `ExecutionResult`,
//! plus the security/monitoring entities that travel alongside them.

use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ── Roles ───────────────────────────────────────────────────────────

/// Principal role. Totally ordered: `readonly < operator < admin < system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Readonly,
    Operator,
    Admin,
    System,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Self::Readonly => 0,
            Self::Operator => 1,
            Self::Admin => 2,
            Self::System => 3,
        }
    }

    /// Returns `true` if this role satisfies a minimum-role requirement.
    #[must_use]
    pub fn satisfies(self, minimum: Role) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

// ── ParsedIntent ────────────────────────────────────────────────────

/// The closed set of actions the NLP engine can classify an utterance into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Connect,
    Disconnect,
    Takeoff,
    Land,
    Move,
    Rotate,
    AltitudeSet,
    Photo,
    VideoStart,
    VideoStop,
    StatusQuery,
    EmergencyStop,
    Help,
    Unknown,
}

/// Cardinal movement direction, Japanese or English surface form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Rotation direction for the `rotate` intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// Parameters extracted alongside an [`Action`]. All optional — which ones
/// are required depends on the action (validated by the router, §4.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntentParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Distance in centimeters, clamped to `[20, 500]` by the NLP engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_cm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_direction: Option<RotationDirection>,
    /// Rotation angle in degrees, clamped to `[1, 360]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_deg: Option<u32>,
    /// Altitude in centimeters, clamped to `[20, 300]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_cm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_drone_id: Option<String>,
}

/// A single parsed clause of natural-language input. Produced by `dgw-nlp`;
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParsedIntent {
    pub action: Action,
    #[serde(default)]
    pub parameters: IntentParameters,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    pub raw_text: String,
    #[serde(default)]
    pub source_tokens: Vec<String>,
}

impl ParsedIntent {
    /// Start building a fully-matched, maximum-confidence intent for `action`.
    #[must_use]
    pub fn new(action: Action, raw_text: impl Into<String>) -> Self {
        Self {
            action,
            parameters: IntentParameters::default(),
            confidence: 1.0,
            raw_text: raw_text.into(),
            source_tokens: Vec::new(),
        }
    }
}

// ── Command / BatchPlan ────────────────────────────────────────────

/// A static precondition the router attaches to a [`Command`], checked
/// against the last known drone-state snapshot before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    /// Drone must be `connected` and currently not flying.
    ConnectedNotFlying,
    /// Drone must currently be flying.
    Flying,
    /// `altitude_cm`/`distance_cm`/`angle_deg` must already be in range
    /// (checked again defensively at dispatch time).
    ParameterInRange,
}

/// HTTP method used by a [`BackendCallTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// A resolved backend HTTP call: method, path (drone id already substituted),
/// and an optional JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BackendCallTemplate {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// One atomic backend operation derived from a [`ParsedIntent`] by the
/// command router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Command {
    pub id: String,
    pub intent: ParsedIntent,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
    pub backend_call_template: BackendCallTemplate,
    pub timeout_ms: u64,
    /// Only idempotent commands are eligible for automatic retry (§4.4, §9).
    pub idempotent: bool,
}

/// Execution mode for a [`BatchPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
    Mixed,
}

/// What the executor does after a command in the batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    StopOnError,
    Continue,
    Rollback,
}

/// An ordered collection of [`Command`]s with a dependency graph and a
/// failure policy. Produced by the router for multi-step utterances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchPlan {
    pub id: String,
    pub commands: Vec<Command>,
    pub mode: ExecutionMode,
    /// Maps a command id to the ids it must wait on.
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub failure_policy: FailurePolicy,
}

impl BatchPlan {
    /// Command ids with no dependency edges — eligible to start immediately.
    #[must_use]
    pub fn roots(&self) -> Vec<&str> {
        self.commands
            .iter()
            .map(|c| c.id.as_str())
            .filter(|id| {
                self.dependencies
                    .get(*id)
                    .map(|deps| deps.is_empty())
                    .unwrap_or(true)
            })
            .collect()
    }
}

// ── ExecutionResult ─────────────────────────────────────────────────

/// Terminal status of a single [`Command`]'s execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Skipped,
    TimedOut,
}

/// The outcome of executing a single [`Command`]. Invariant: every `Command`
/// produces exactly one `ExecutionResult` with one terminal status (§3.1).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionResult {
    pub command_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub error: Option<GatewayError>,
    /// Number of attempts made, including the final one. `1` unless a retry
    /// occurred.
    #[serde(default = "one")]
    pub attempts: u32,
}

fn one() -> u32 {
    1
}

/// Aggregate status of a [`BatchPlan`]'s executions (§7 propagation policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Partial,
    Failed,
}

impl BatchStatus {
    /// Fold a slice of per-command results into the batch-level status.
    #[must_use]
    pub fn aggregate(results: &[ExecutionResult]) -> Self {
        if results.is_empty() {
            return Self::Success;
        }
        let succeeded = results
            .iter()
            .filter(|r| r.status == ExecutionStatus::Success)
            .count();
        if succeeded == results.len() {
            Self::Success
        } else if succeeded == 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

// ── Principal / Session ────────────────────────────────────────────

/// How a [`Principal`] authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Jwt,
    ApiKey,
}

/// The authenticated identity behind a request. Materialized per-request
/// from authn material; never persisted across process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub credential_kind: CredentialKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowlist_ips: Option<Vec<String>>,
}

/// Token-bucket state for a single principal's rate limit (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateState {
    /// Tokens currently available.
    pub tokens: f64,
    /// Last time the bucket was refilled.
    pub last_refill: DateTime<Utc>,
}

/// One connected peer. Born on connect, destroyed on EOF, idle expiry, or
/// credential expiry. Never crosses a process restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub principal: Principal,
    pub started_at: DateTime<Utc>,
    pub request_count: u64,
    pub last_activity: DateTime<Utc>,
    pub rate_state: RateState,
}

// ── SecurityEvent ───────────────────────────────────────────────────

/// Severity tier for a [`SecurityEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Med,
    High,
    Critical,
}

/// A single security-relevant occurrence, appended to the bounded audit
/// ring buffer (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SecurityEvent {
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    pub description: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

// ── MetricSample ────────────────────────────────────────────────────

/// The three instrument kinds exposed by `dgw-telemetry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// One observation of a named instrument.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricSample {
    pub name: String,
    pub kind: MetricKind,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    pub ts: DateTime<Utc>,
}

// ── Catalog descriptors ─────────────────────────────────────────────

/// An immutable tool catalog entry, loaded at init (§9: compile-time table,
/// not dynamic dispatch by name).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolDescriptor {
    pub name: &'static str,
    #[schemars(skip)]
    pub input_schema: serde_json::Value,
    pub min_role: Role,
}

/// An immutable resource catalog entry, loaded at init.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceDescriptor {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub min_role: Role,
}
