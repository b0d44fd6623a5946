// SPDX-License-Identifier: MIT OR Apache-2.0
//! Confidence scoring (§4.2). Deterministic, rule-based: actions that need
//! no parameters score high on a keyword hit alone; actions with required
//! parameters are penalized for each one that's missing.

use dgw_core::{Action, IntentParameters};

fn required_params_present(action: Action, params: &IntentParameters) -> (usize, usize) {
    match action {
        Action::Move => {
            let total = 2;
            let present =
                usize::from(params.direction.is_some()) + usize::from(params.distance_cm.is_some());
            (present, total)
        }
        Action::Rotate => {
            let total = 2;
            let present = usize::from(params.rotation_direction.is_some())
                + usize::from(params.angle_deg.is_some());
            (present, total)
        }
        Action::AltitudeSet => (usize::from(params.altitude_cm.is_some()), 1),
        _ => (0, 0),
    }
}

/// Score a classified action + extracted parameters in `[0, 1]`.
///
/// `Action::Unknown` always scores `0.0` (never produces a `Command`, per
/// §3's invariant that low-confidence intents never do). Actions with no
/// required parameters score `0.9` on a bare keyword match. Actions with
/// required parameters lose `0.25` confidence per missing parameter.
#[must_use]
pub fn score(action: Action, params: &IntentParameters) -> f64 {
    if action == Action::Unknown {
        return 0.0;
    }
    let (present, total) = required_params_present(action, params);
    if total == 0 {
        return 0.9;
    }
    let missing = total - present;
    (0.95 - 0.25 * missing as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_scores_zero() {
        assert_eq!(score(Action::Unknown, &IntentParameters::default()), 0.0);
    }

    #[test]
    fn parameterless_action_scores_high() {
        assert_eq!(score(Action::Takeoff, &IntentParameters::default()), 0.9);
    }

    #[test]
    fn move_with_all_params_scores_highest() {
        let params = IntentParameters {
            direction: Some(dgw_core::Direction::Forward),
            distance_cm: Some(100),
            ..Default::default()
        };
        assert_eq!(score(Action::Move, &params), 0.95);
    }

    #[test]
    fn move_missing_distance_is_penalized() {
        let params = IntentParameters {
            direction: Some(dgw_core::Direction::Forward),
            ..Default::default()
        };
        assert_eq!(score(Action::Move, &params), 0.70);
    }

    #[test]
    fn move_missing_both_params_scores_lowest() {
        assert_eq!(score(Action::Move, &IntentParameters::default()), 0.45);
    }
}
