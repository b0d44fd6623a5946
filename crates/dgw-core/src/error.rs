// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

//! Error taxonomy for the drone gateway.
//!
//! [`ErrorKind`] enumerates every category the gateway can surface; each
//! kind carries a fixed mapping onto the JSON-RPC top-level error code used
//! by `dgw-protocol`. Most kinds fold into the generic `-32000
//! application_error` code and are distinguished only by `data.kind` —
//! only lifecycle and transport-level failures get a distinct top-level
//! code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of error categories the gateway can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed JSON-RPC frame.
    ParseError,
    /// Tool/resource arguments failed schema validation.
    InvalidParams,
    /// A request arrived before `initialize` completed.
    NotInitialized,
    /// The server is draining; new tool calls are refused.
    ShuttingDown,
    /// The requested method name is not registered.
    MethodNotFound,
    /// Credential missing, malformed, or rejected.
    Unauthorized,
    /// Principal's role is below the tool/resource's minimum role.
    Forbidden,
    /// Token bucket exhausted for this principal.
    RateLimited,
    /// Source identifier is in a lockout window.
    LockedOut,
    /// Parsed intent confidence fell below the configured threshold.
    LowConfidence,
    /// Multiple candidate intents tied; caller must disambiguate.
    Ambiguous,
    /// A command's static precondition check failed.
    PreconditionFailed,
    /// Backend returned 5xx or the transport failed.
    BackendUnavailable,
    /// Backend returned 401/403.
    BackendAuthFailed,
    /// Backend returned 404.
    NotFound,
    /// Backend returned 409.
    Conflict,
    /// Backend returned 400.
    InvalidArgument,
    /// A deadline elapsed before completion.
    TimedOut,
    /// The operation was cancelled.
    Cancelled,
    /// Worker pool/queue backpressure limit reached.
    Overloaded,
    /// Unclassified internal failure; always paired with an audit event.
    InternalError,
}

impl ErrorKind {
    /// The JSON-RPC top-level numeric code this kind maps to.
    ///
    /// Most kinds are reported as `-32000` (`application_error`) with the
    /// kind itself carried in the error object's `data.kind` field; only
    /// the handful of protocol-lifecycle and transport kinds below get a
    /// reserved top-level code of their own.
    #[must_use]
    pub fn rpc_code(&self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::Unauthorized | Self::LockedOut => -32001,
            Self::Forbidden => -32003,
            Self::NotInitialized => -32002,
            Self::ShuttingDown => -32004,
            Self::RateLimited => -32005,
            Self::Overloaded => -32006,
            Self::InternalError => -32603,
            Self::LowConfidence
            | Self::Ambiguous
            | Self::PreconditionFailed
            | Self::BackendUnavailable
            | Self::BackendAuthFailed
            | Self::NotFound
            | Self::Conflict
            | Self::InvalidArgument
            | Self::TimedOut
            | Self::Cancelled => -32000,
        }
    }

    /// Stable lowercase-snake-case name, as serialized in `data.kind`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::InvalidParams => "invalid_params",
            Self::NotInitialized => "not_initialized",
            Self::ShuttingDown => "shutting_down",
            Self::MethodNotFound => "method_not_found",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::LockedOut => "locked_out",
            Self::LowConfidence => "low_confidence",
            Self::Ambiguous => "ambiguous",
            Self::PreconditionFailed => "precondition_failed",
            Self::BackendUnavailable => "backend_unavailable",
            Self::BackendAuthFailed => "backend_auth_failed",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid_argument",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::Overloaded => "overloaded",
            Self::InternalError => "internal_error",
        }
    }

    /// Whether a call classified with this kind is eligible for automatic
    /// retry inside the batch executor (§4.4). Only transient, idempotent-safe
    /// transport failures qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable | Self::TimedOut)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rich error value that crosses every component boundary in the gateway.
///
/// Carries an [`ErrorKind`], a human message, structured context, and the
/// retry/candidate hints the protocol layer forwards in `error.data`.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// The taxonomy kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Arbitrary key-value context, deterministically ordered.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested retry delay, for `rate_limited`/`backend_unavailable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Whether the caller may retry this exact request and expect it to
    /// eventually succeed without operator intervention.
    #[serde(default)]
    pub recoverable: bool,
    /// Alternative parse candidates, for `low_confidence`/`ambiguous`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

impl GatewayError {
    /// Start building a [`GatewayError`] for the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: BTreeMap::new(),
            retry_after_ms: None,
            recoverable: false,
            candidates: Vec::new(),
        }
    }

    /// Add a key-value context entry.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach a retry-after hint and mark the error recoverable.
    #[must_use]
    pub fn with_retry_after(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self.recoverable = true;
        self
    }

    /// Attach alternative-candidate strings (NLP disambiguation).
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Mark whether the caller can expect a retry to eventually succeed.
    #[must_use]
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Shorthand for [`ErrorKind::parse_error`](ErrorKind::ParseError).
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    /// Shorthand for [`ErrorKind::InvalidParams`].
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Shorthand for [`ErrorKind::MethodNotFound`].
    #[must_use]
    pub fn method_not_found(method: impl Into<String>) -> Self {
        let method = method.into();
        Self::new(ErrorKind::MethodNotFound, format!("unknown method: {method}"))
            .with_context("method", method)
    }

    /// Shorthand for [`ErrorKind::Unauthorized`].
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Shorthand for [`ErrorKind::Forbidden`].
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Shorthand for [`ErrorKind::InternalError`], always intended to be
    /// paired with an audit event by the caller.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if !self.context.is_empty() {
            write!(f, " (")?;
            let mut first = true;
            for (k, v) in &self.context {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{k}={v}")?;
                first = false;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("context", &self.context)
            .field("retry_after_ms", &self.retry_after_ms)
            .field("recoverable", &self.recoverable)
            .finish()
    }
}

impl std::error::Error for GatewayError {}

/// Convenience result type used across the gateway.
pub type GatewayResult<T> = Result<T, GatewayError>;
