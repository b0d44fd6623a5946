// SPDX-License-Identifier: MIT OR Apache-2.0
//! Protocol server lifecycle state machine (§4.1): `created → initialized →
//! serving → draining → closed`.

use serde::{Deserialize, Serialize};

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    /// Process started; `initialize` has not yet completed.
    Created,
    /// `initialize` completed; not yet accepting tool calls.
    Initialized,
    /// Accepting tool/resource calls.
    Serving,
    /// `shutdown` received; in-flight work continues, new calls are refused.
    Draining,
    /// Fully stopped.
    Closed,
}

impl ServerState {
    /// Returns the set of states that are valid successors of `self`.
    #[must_use]
    pub fn valid_transitions(&self) -> &'static [ServerState] {
        match self {
            Self::Created => &[Self::Initialized],
            Self::Initialized => &[Self::Serving],
            Self::Serving => &[Self::Draining],
            Self::Draining => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    /// Returns `true` if transitioning from `self` to `next` is valid.
    #[must_use]
    pub fn can_transition_to(&self, next: ServerState) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Tool calls are only accepted while `Serving` (§4.1).
    #[must_use]
    pub fn accepts_tool_calls(&self) -> bool {
        matches!(self, Self::Serving)
    }

    /// `true` once the server has finished initializing.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle_is_linear() {
        let mut state = ServerState::Created;
        let path = [
            ServerState::Initialized,
            ServerState::Serving,
            ServerState::Draining,
            ServerState::Closed,
        ];
        for next in path {
            assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
            state = next;
        }
        assert!(state.valid_transitions().is_empty());
    }

    #[test]
    fn cannot_skip_initialization() {
        assert!(!ServerState::Created.can_transition_to(ServerState::Serving));
    }

    #[test]
    fn only_serving_accepts_tool_calls() {
        assert!(ServerState::Serving.accepts_tool_calls());
        assert!(!ServerState::Initialized.accepts_tool_calls());
        assert!(!ServerState::Draining.accepts_tool_calls());
    }
}
