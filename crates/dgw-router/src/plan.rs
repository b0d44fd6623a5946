// SPDX-License-Identifier: MIT OR Apache-2.0
//! Batch planning: turn a sequence of [`ParsedIntent`]s into a [`BatchPlan`]
//! with inferred dependency edges (§4.3).

use crate::mapping::route;
use dgw_core::{Action, BatchPlan, Command, ExecutionMode, FailurePolicy, ParsedIntent};
use std::collections::BTreeMap;

/// Build a [`BatchPlan`] from a clause-ordered sequence of intents.
///
/// Dependency inference (§4.3): a `connect` command gates every later
/// command targeting the same drone id; a `takeoff` command gates every
/// later movement-class command (`move`/`rotate`/`altitude_set`/`photo`/
/// `video_start`/`video_stop`) for that drone. `mode` is `Sequential` when
/// any dependency edge exists, `Parallel` otherwise (independent commands
/// run concurrently; §4.4's default worker pool bounds concurrency).
pub fn build_batch_plan(
    batch_id: impl Into<String>,
    intents: &[ParsedIntent],
    failure_policy: FailurePolicy,
) -> dgw_core::GatewayResult<BatchPlan> {
    let mut commands = Vec::with_capacity(intents.len());
    let mut dependencies: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut last_connect: BTreeMap<String, String> = BTreeMap::new();
    let mut last_takeoff: BTreeMap<String, String> = BTreeMap::new();

    for (index, intent) in intents.iter().enumerate() {
        let decision = route(intent)?;
        let command_id = format!("c{index}");
        let drone_id = intent.parameters.target_drone_id.clone();

        let mut deps = Vec::new();
        if let Some(drone_id) = &drone_id {
            if intent.action != Action::Connect {
                if let Some(connect_id) = last_connect.get(drone_id) {
                    deps.push(connect_id.clone());
                }
            }
            if is_movement_class(intent.action) {
                if let Some(takeoff_id) = last_takeoff.get(drone_id) {
                    if !deps.contains(takeoff_id) {
                        deps.push(takeoff_id.clone());
                    }
                }
            }
        }
        dependencies.insert(command_id.clone(), deps);

        if let Some(drone_id) = &drone_id {
            match intent.action {
                Action::Connect => {
                    last_connect.insert(drone_id.clone(), command_id.clone());
                }
                Action::Takeoff => {
                    last_takeoff.insert(drone_id.clone(), command_id.clone());
                }
                Action::Land => {
                    last_takeoff.remove(drone_id);
                }
                _ => {}
            }
        }

        commands.push(Command {
            id: command_id,
            intent: intent.clone(),
            preconditions: decision.preconditions,
            backend_call_template: decision.backend_call_template,
            timeout_ms: decision.timeout_ms,
            idempotent: decision.idempotent,
        });
    }

    let mode = if dependencies.values().any(|deps| !deps.is_empty()) {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Parallel
    };

    Ok(BatchPlan {
        id: batch_id.into(),
        commands,
        mode,
        dependencies,
        failure_policy,
    })
}

fn is_movement_class(action: Action) -> bool {
    matches!(
        action,
        Action::Move
            | Action::Rotate
            | Action::AltitudeSet
            | Action::Photo
            | Action::VideoStart
            | Action::VideoStop
    )
}

/// Build a compensating `land` command for a drone left airborne after a
/// failed post-takeoff command, per §4.3's documented rollback subset.
#[must_use]
pub fn compensating_land(drone_id: &str, command_id: impl Into<String>) -> Command {
    use dgw_core::{BackendCallTemplate, HttpMethod, ParsedIntent, Precondition};

    Command {
        id: command_id.into(),
        intent: ParsedIntent::new(Action::Land, format!("rollback: land {drone_id}")),
        preconditions: vec![Precondition::Flying],
        backend_call_template: BackendCallTemplate {
            method: HttpMethod::Post,
            path: format!("/drones/{drone_id}/land"),
            body: None,
        },
        timeout_ms: 15_000,
        idempotent: true,
    }
}
