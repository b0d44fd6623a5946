// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! Allow missing docs on test-only items and re-exports; the substantive
//! surface is documented at its definition site in [`model`] and [`error`].
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod model;
pub mod nlp_defaults;

pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use model::{
    Action, BackendCallTemplate, BatchPlan, BatchStatus, Command, CredentialKind, Direction,
    ExecutionMode, ExecutionResult, ExecutionStatus, FailurePolicy, HttpMethod, IntentParameters,
    MetricKind, MetricSample, ParsedIntent, Precondition, Principal, RateState, ResourceDescriptor,
    Role, RotationDirection, SecurityEvent, Session, Severity, ToolDescriptor,
};

/// Protocol/contract version string advertised by `initialize` (§4.1).
pub const CONTRACT_VERSION: &str = "1.0.0";
