// SPDX-License-Identifier: MIT OR Apache-2.0
//! Intent → backend-call mapping table (§4.3).

use dgw_core::{
    Action, BackendCallTemplate, ErrorKind, GatewayError, GatewayResult, HttpMethod,
    IntentParameters, ParsedIntent, Precondition,
};

/// Default per-command timeout, milliseconds. Overridden per-action below
/// where a longer/shorter deadline is warranted.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// A fully-resolved routing decision for one [`ParsedIntent`]: the backend
/// call to make, the preconditions to check first, the timeout, and whether
/// the call is safe to auto-retry.
pub struct RoutingDecision {
    pub backend_call_template: BackendCallTemplate,
    pub preconditions: Vec<Precondition>,
    pub timeout_ms: u64,
    pub idempotent: bool,
}

fn require_drone_id(params: &IntentParameters) -> GatewayResult<&str> {
    params.target_drone_id.as_deref().ok_or_else(|| {
        GatewayError::new(
            ErrorKind::InvalidArgument,
            "no target drone id in intent or session context",
        )
    })
}

/// Resolve one [`ParsedIntent`] into a [`RoutingDecision`], per §4.3's
/// per-action table. `Action::Help` and `Action::Unknown` never produce a
/// backend call and are rejected here.
pub fn route(intent: &ParsedIntent) -> GatewayResult<RoutingDecision> {
    let params = &intent.parameters;

    match intent.action {
        Action::Connect => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/connect"),
                    body: None,
                },
                preconditions: vec![],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::Disconnect => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/disconnect"),
                    body: None,
                },
                preconditions: vec![],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: true,
            })
        }
        Action::Takeoff => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/takeoff"),
                    body: None,
                },
                preconditions: vec![Precondition::ConnectedNotFlying],
                timeout_ms: 15_000,
                idempotent: false,
            })
        }
        Action::Land => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/land"),
                    body: None,
                },
                preconditions: vec![Precondition::Flying],
                timeout_ms: 15_000,
                idempotent: true,
            })
        }
        Action::Move => {
            let drone_id = require_drone_id(params)?;
            let direction = params.direction.ok_or_else(|| {
                GatewayError::new(ErrorKind::InvalidArgument, "move requires a direction")
            })?;
            let distance_cm = params.distance_cm.ok_or_else(|| {
                GatewayError::new(ErrorKind::InvalidArgument, "move requires a distance_cm")
            })?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/move"),
                    body: Some(serde_json::json!({
                        "direction": direction,
                        "distance_cm": distance_cm,
                    })),
                },
                preconditions: vec![Precondition::Flying, Precondition::ParameterInRange],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::Rotate => {
            let drone_id = require_drone_id(params)?;
            let rotation_direction = params.rotation_direction.ok_or_else(|| {
                GatewayError::new(ErrorKind::InvalidArgument, "rotate requires a rotation_direction")
            })?;
            let angle_deg = params.angle_deg.ok_or_else(|| {
                GatewayError::new(ErrorKind::InvalidArgument, "rotate requires an angle_deg")
            })?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/rotate"),
                    body: Some(serde_json::json!({
                        "rotation_direction": rotation_direction,
                        "angle_deg": angle_deg,
                    })),
                },
                preconditions: vec![Precondition::Flying, Precondition::ParameterInRange],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::AltitudeSet => {
            let drone_id = require_drone_id(params)?;
            let altitude_cm = params.altitude_cm.ok_or_else(|| {
                GatewayError::new(ErrorKind::InvalidArgument, "altitude_set requires an altitude_cm")
            })?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/altitude"),
                    body: Some(serde_json::json!({ "altitude_cm": altitude_cm })),
                },
                preconditions: vec![Precondition::Flying, Precondition::ParameterInRange],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::Photo => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/photo"),
                    body: None,
                },
                preconditions: vec![Precondition::Flying],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::VideoStart => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/video/start"),
                    body: None,
                },
                preconditions: vec![Precondition::Flying],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: false,
            })
        }
        Action::VideoStop => {
            let drone_id = require_drone_id(params)?;
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path: format!("/drones/{drone_id}/video/stop"),
                    body: None,
                },
                preconditions: vec![Precondition::Flying],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: true,
            })
        }
        Action::StatusQuery => {
            let path = match params.target_drone_id.as_deref() {
                Some(drone_id) => format!("/drones/{drone_id}/status"),
                None => "/drones".to_string(),
            };
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Get,
                    path,
                    body: None,
                },
                preconditions: vec![],
                timeout_ms: DEFAULT_TIMEOUT_MS,
                idempotent: true,
            })
        }
        Action::EmergencyStop => {
            let path = match params.target_drone_id.as_deref() {
                Some(drone_id) => format!("/drones/{drone_id}/emergency_stop"),
                None => "/fleet/emergency_stop".to_string(),
            };
            Ok(RoutingDecision {
                backend_call_template: BackendCallTemplate {
                    method: HttpMethod::Post,
                    path,
                    body: None,
                },
                preconditions: vec![],
                timeout_ms: 5_000,
                idempotent: true,
            })
        }
        Action::Help | Action::Unknown => Err(GatewayError::new(
            ErrorKind::InvalidArgument,
            format!("{:?} does not route to a backend call", intent.action),
        )),
    }
}
