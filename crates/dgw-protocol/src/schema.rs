// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON Schema validation of `tools/call` arguments against a tool's
//! declared [`dgw_core::ToolDescriptor::input_schema`], per §4.1's dispatch
//! contract: "validate params against tool's declared input schema →
//! `-32602 invalid_params`". This is what actually enforces the `minimum`/
//! `maximum` bounds baked into the catalog's schemas (`dgw-nlp` and
//! `dgw-router` separately enforce the same bounds for natural-language
//! input; this module covers the direct `tools/call` path).

use dgw_core::{ErrorKind, GatewayError, GatewayResult};
use serde_json::Value;

/// Validate `arguments` against a tool's declared `schema`. Every violation
/// found is joined into a single `invalid_params` error.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> GatewayResult<()> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|err| GatewayError::internal(format!("tool schema is not valid JSON Schema: {err}")))?;

    let errors: Vec<String> = validator.iter_errors(arguments).map(|err| err.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::new(ErrorKind::InvalidParams, errors.join("; ")))
    }
}
