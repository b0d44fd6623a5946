// SPDX-License-Identifier: MIT OR Apache-2.0
//! Precondition evaluation against a live drone-state snapshot (§4.3). The
//! snapshot itself is owned and mutated by `dgw-executor`; this module only
//! evaluates a single [`Precondition`] against one.

use dgw_core::{Command, ErrorKind, GatewayError, GatewayResult, Precondition};

/// `[20, 300]`, re-checked defensively at dispatch time even though
/// `dgw-nlp` already clamps `altitude_cm` on extraction.
const ALTITUDE_CM_RANGE: std::ops::RangeInclusive<u32> = 20..=300;
/// `[20, 500]` per §4.2 — `dgw-nlp` extracts `distance_cm` raw/unclamped, so
/// this is the only place an out-of-range value is ever rejected.
const DISTANCE_CM_RANGE: std::ops::RangeInclusive<u32> = 20..=500;
/// `[1, 360]` per §4.2 — `dgw-nlp` extracts `angle_deg` raw/unclamped, so
/// this is the only place an out-of-range value is ever rejected.
const ANGLE_DEG_RANGE: std::ops::RangeInclusive<u32> = 1..=360;

/// Last-known connectivity/flight state for one drone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroneState {
    pub connected: bool,
    pub flying: bool,
}

/// Evaluate every precondition on `command` against `state`. Returns the
/// first failure as a `precondition_failed` [`GatewayError`].
pub fn check_all(command: &Command, state: DroneState) -> GatewayResult<()> {
    for precondition in &command.preconditions {
        check_one(*precondition, command, state)?;
    }
    Ok(())
}

fn check_one(precondition: Precondition, command: &Command, state: DroneState) -> GatewayResult<()> {
    match precondition {
        Precondition::ConnectedNotFlying if !state.connected || state.flying => {
            Err(precondition_failed("drone must be connected and not flying"))
        }
        Precondition::Flying if !state.flying => Err(precondition_failed("drone must be flying")),
        Precondition::ParameterInRange => {
            let params = &command.intent.parameters;
            if let Some(altitude_cm) = params.altitude_cm {
                if !ALTITUDE_CM_RANGE.contains(&altitude_cm) {
                    return Err(precondition_failed("altitude_cm out of range at dispatch time"));
                }
            }
            if let Some(distance_cm) = params.distance_cm {
                if !DISTANCE_CM_RANGE.contains(&distance_cm) {
                    return Err(precondition_failed("distance_cm out of range at dispatch time"));
                }
            }
            if let Some(angle_deg) = params.angle_deg {
                if !ANGLE_DEG_RANGE.contains(&angle_deg) {
                    return Err(precondition_failed("angle_deg out of range at dispatch time"));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn precondition_failed(message: &str) -> GatewayError {
    GatewayError::new(ErrorKind::PreconditionFailed, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::{Action, BackendCallTemplate, HttpMethod, ParsedIntent};

    fn command_with(preconditions: Vec<Precondition>) -> Command {
        Command {
            id: "c0".into(),
            intent: ParsedIntent::new(Action::Takeoff, "test"),
            preconditions,
            backend_call_template: BackendCallTemplate {
                method: HttpMethod::Post,
                path: "/drones/A1/takeoff".into(),
                body: None,
            },
            timeout_ms: 1000,
            idempotent: false,
        }
    }

    #[test]
    fn takeoff_precondition_rejects_already_flying() {
        let cmd = command_with(vec![Precondition::ConnectedNotFlying]);
        let state = DroneState { connected: true, flying: true };
        let err = check_all(&cmd, state).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
    }

    #[test]
    fn takeoff_precondition_passes_when_connected_and_grounded() {
        let cmd = command_with(vec![Precondition::ConnectedNotFlying]);
        let state = DroneState { connected: true, flying: false };
        assert!(check_all(&cmd, state).is_ok());
    }

    #[test]
    fn move_precondition_requires_flying() {
        let cmd = command_with(vec![Precondition::Flying]);
        assert!(check_all(&cmd, DroneState { connected: true, flying: false }).is_err());
        assert!(check_all(&cmd, DroneState { connected: true, flying: true }).is_ok());
    }

    fn move_command_with_distance(distance_cm: u32) -> Command {
        let mut cmd = command_with(vec![Precondition::Flying, Precondition::ParameterInRange]);
        cmd.intent = ParsedIntent::new(Action::Move, "test");
        cmd.intent.parameters.distance_cm = Some(distance_cm);
        cmd
    }

    #[test]
    fn move_with_out_of_range_distance_fails_precondition() {
        // S4: move(AA, right, 9999cm) must fail as precondition_failed, not
        // silently succeed with a clamped distance.
        let cmd = move_command_with_distance(9999);
        let err = check_all(&cmd, DroneState { connected: true, flying: true }).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
    }

    #[test]
    fn move_with_in_range_distance_passes() {
        let cmd = move_command_with_distance(100);
        assert!(check_all(&cmd, DroneState { connected: true, flying: true }).is_ok());
    }

    #[test]
    fn move_with_below_minimum_distance_fails_precondition() {
        let cmd = move_command_with_distance(19);
        let err = check_all(&cmd, DroneState { connected: true, flying: true }).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
    }

    #[test]
    fn rotate_with_out_of_range_angle_fails_precondition() {
        let mut cmd = command_with(vec![Precondition::Flying, Precondition::ParameterInRange]);
        cmd.intent = ParsedIntent::new(Action::Rotate, "test");
        cmd.intent.parameters.angle_deg = Some(720);
        let err = check_all(&cmd, DroneState { connected: true, flying: true }).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
    }
}
