// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod alerts;
pub mod audit;
pub mod prometheus;
pub mod registry;

pub use alerts::{Alert, AlertEngine, AlertRule, AlertState, Comparison};
pub use audit::AuditLog;
pub use prometheus::render as render_prometheus;
pub use registry::MetricsRegistry;
