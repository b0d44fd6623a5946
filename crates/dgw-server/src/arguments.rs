// SPDX-License-Identifier: MIT OR Apache-2.0
//! Maps `tools/call` arguments onto a [`ParsedIntent`] for every
//! direct-action tool in the catalog (everything except
//! `execute_natural_language_command`, which goes through `dgw-nlp`
//! instead — see `Server::handle_tools_call`).

use dgw_core::{Action, Direction, ErrorKind, GatewayError, GatewayResult, ParsedIntent, RotationDirection};
use serde_json::Value;

fn invalid(message: impl Into<String>) -> GatewayError {
    GatewayError::new(ErrorKind::InvalidParams, message)
}

fn required_str(args: &Value, field: &str) -> GatewayResult<String> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("missing required argument: {field}")))
}

fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(Value::as_str).map(str::to_string)
}

fn required_u32(args: &Value, field: &str) -> GatewayResult<u32> {
    args.get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| invalid(format!("missing or invalid required argument: {field}")))
}

fn required_enum<T: serde::de::DeserializeOwned>(args: &Value, field: &str) -> GatewayResult<T> {
    args.get(field)
        .cloned()
        .ok_or_else(|| invalid(format!("missing required argument: {field}")))
        .and_then(|v| serde_json::from_value(v).map_err(|e| invalid(format!("invalid {field}: {e}"))))
}

/// Build a [`ParsedIntent`] for one of the catalog's direct-action tools.
pub fn intent_for_tool(tool_name: &str, args: &Value) -> GatewayResult<ParsedIntent> {
    let mut intent = match tool_name {
        "connect_drone" => ParsedIntent::new(Action::Connect, "tools/call:connect_drone"),
        "disconnect_drone" => ParsedIntent::new(Action::Disconnect, "tools/call:disconnect_drone"),
        "takeoff" => ParsedIntent::new(Action::Takeoff, "tools/call:takeoff"),
        "land" => ParsedIntent::new(Action::Land, "tools/call:land"),
        "take_photo" => ParsedIntent::new(Action::Photo, "tools/call:take_photo"),
        "emergency_stop" => ParsedIntent::new(Action::EmergencyStop, "tools/call:emergency_stop"),
        "move" => ParsedIntent::new(Action::Move, "tools/call:move"),
        "rotate" => ParsedIntent::new(Action::Rotate, "tools/call:rotate"),
        other => return Err(GatewayError::method_not_found(other)),
    };

    match tool_name {
        "emergency_stop" => {
            intent.parameters.target_drone_id = optional_str(args, "drone_id");
        }
        "move" => {
            intent.parameters.target_drone_id = Some(required_str(args, "drone_id")?);
            intent.parameters.direction = Some(required_enum::<Direction>(args, "direction")?);
            intent.parameters.distance_cm = Some(required_u32(args, "distance_cm")?);
        }
        "rotate" => {
            intent.parameters.target_drone_id = Some(required_str(args, "drone_id")?);
            intent.parameters.rotation_direction =
                Some(required_enum::<RotationDirection>(args, "rotation_direction")?);
            intent.parameters.angle_deg = Some(required_u32(args, "angle_deg")?);
        }
        _ => {
            intent.parameters.target_drone_id = Some(required_str(args, "drone_id")?);
        }
    }

    Ok(intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_drone_requires_drone_id() {
        let err = intent_for_tool("connect_drone", &serde_json::json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidParams);
    }

    #[test]
    fn move_parses_direction_and_distance() {
        let intent = intent_for_tool(
            "move",
            &serde_json::json!({"drone_id": "A1", "direction": "forward", "distance_cm": 100}),
        )
        .unwrap();
        assert_eq!(intent.parameters.direction, Some(Direction::Forward));
        assert_eq!(intent.parameters.distance_cm, Some(100));
        assert_eq!(intent.parameters.target_drone_id.as_deref(), Some("A1"));
    }

    #[test]
    fn rotate_parses_rotation_direction_and_angle() {
        let intent = intent_for_tool(
            "rotate",
            &serde_json::json!({"drone_id": "A1", "rotation_direction": "clockwise", "angle_deg": 90}),
        )
        .unwrap();
        assert_eq!(intent.parameters.rotation_direction, Some(RotationDirection::Clockwise));
        assert_eq!(intent.parameters.angle_deg, Some(90));
    }

    #[test]
    fn emergency_stop_allows_missing_drone_id() {
        let intent = intent_for_tool("emergency_stop", &serde_json::json!({})).unwrap();
        assert!(intent.parameters.target_drone_id.is_none());
    }

    #[test]
    fn unknown_tool_is_method_not_found() {
        let err = intent_for_tool("not_a_tool", &serde_json::json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MethodNotFound);
    }
}
