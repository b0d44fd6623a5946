// SPDX-License-Identifier: MIT OR Apache-2.0
//! Role-based authorization (§4.5): total role order, minimum-role checks.

use dgw_core::{ErrorKind, GatewayError, GatewayResult, Role};

/// Authorize `role` against a `minimum` requirement, per the tool/resource
/// catalog's `min_role` (§4.1).
pub fn authorize(role: Role, minimum: Role) -> GatewayResult<()> {
    if role.satisfies(minimum) {
        Ok(())
    } else {
        Err(GatewayError::new(
            ErrorKind::Forbidden,
            format!("role {role:?} does not satisfy minimum {minimum:?}"),
        ))
    }
}
