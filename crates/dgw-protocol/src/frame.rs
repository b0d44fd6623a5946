// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON-RPC 2.0 frame types and the newline-delimited codec (§4.1, §6).

use dgw_core::{ErrorKind, GatewayError};
use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 `id` field: string, number, or null. A `null`/absent id
/// marks a notification (no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// An inbound JSON-RPC request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// `true` if this request carries no `id` (or a `null` one) and
    /// therefore expects no response.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(RequestId::Null))
    }
}

/// Structured error object embedded in a failed [`JsonRpcResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorObject {
    /// Build the top-level JSON-RPC error from a [`GatewayError`], folding
    /// its taxonomy kind, context, and retry hints into `data` (§7).
    #[must_use]
    pub fn from_gateway_error(err: &GatewayError) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("kind".into(), serde_json::json!(err.kind.as_str()));
        if !err.context.is_empty() {
            data.insert("context".into(), serde_json::json!(err.context));
        }
        if let Some(ms) = err.retry_after_ms {
            data.insert("retry_after_ms".into(), serde_json::json!(ms));
        }
        data.insert("recoverable".into(), serde_json::json!(err.recoverable));
        if !err.candidates.is_empty() {
            data.insert("candidates".into(), serde_json::json!(err.candidates));
        }

        Self {
            code: err.kind.rpc_code(),
            message: err.message.clone(),
            data: Some(serde_json::Value::Object(data)),
        }
    }
}

/// An outbound JSON-RPC response: exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Build a success response.
    #[must_use]
    pub fn success(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response from a [`GatewayError`].
    #[must_use]
    pub fn failure(id: RequestId, err: &GatewayError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcErrorObject::from_gateway_error(err)),
        }
    }
}

/// Stateless codec for newline-delimited JSON-RPC frames.
#[derive(Debug, Clone, Copy)]
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    /// Decode a single input line into a [`JsonRpcRequest`].
    ///
    /// Returns a `parse_error` [`GatewayError`] for malformed JSON or a
    /// missing/incorrect `jsonrpc` version, matching §4.1's dispatch
    /// contract (frame syntax is validated before method lookup).
    pub fn decode_request(line: &str) -> Result<JsonRpcRequest, GatewayError> {
        let req: JsonRpcRequest = serde_json::from_str(line)
            .map_err(|e| GatewayError::parse_error(format!("invalid JSON-RPC frame: {e}")))?;
        if req.jsonrpc != "2.0" {
            return Err(GatewayError::new(
                ErrorKind::ParseError,
                format!("unsupported jsonrpc version: {}", req.jsonrpc),
            ));
        }
        Ok(req)
    }

    /// Encode a [`JsonRpcResponse`] as a newline-terminated JSON string.
    pub fn encode_response(resp: &JsonRpcResponse) -> Result<String, GatewayError> {
        let mut s = serde_json::to_string(resp)
            .map_err(|e| GatewayError::internal(format!("failed to encode response: {e}")))?;
        s.push('\n');
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_json() {
        let err = JsonRpcCodec::decode_request("not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let line = r#"{"jsonrpc":"1.0","id":1,"method":"tools/list"}"#;
        let err = JsonRpcCodec::decode_request(line).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn decode_accepts_valid_request() {
        let line = r#"{"jsonrpc":"2.0","id":"r1","method":"tools/list","params":{}}"#;
        let req = JsonRpcCodec::decode_request(line).unwrap();
        assert_eq!(req.method, "tools/list");
        assert!(!req.is_notification());
    }

    #[test]
    fn null_or_missing_id_is_notification() {
        let line = r#"{"jsonrpc":"2.0","method":"shutdown"}"#;
        let req = JsonRpcCodec::decode_request(line).unwrap();
        assert!(req.is_notification());

        let line = r#"{"jsonrpc":"2.0","id":null,"method":"shutdown"}"#;
        let req = JsonRpcCodec::decode_request(line).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn encode_success_roundtrips_through_json() {
        let resp = JsonRpcResponse::success(RequestId::String("r1".into()), serde_json::json!({"ok": true}));
        let line = JsonRpcCodec::encode_response(&resp).unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["result"]["ok"], serde_json::json!(true));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn encode_failure_carries_taxonomy_kind_in_data() {
        let err = GatewayError::new(ErrorKind::RateLimited, "slow down").with_retry_after(2000);
        let resp = JsonRpcResponse::failure(RequestId::Number(1), &err);
        let line = JsonRpcCodec::encode_response(&resp).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["error"]["code"], serde_json::json!(-32005));
        assert_eq!(value["error"]["data"]["kind"], serde_json::json!("rate_limited"));
        assert_eq!(value["error"]["data"]["retry_after_ms"], serde_json::json!(2000));
    }
}
