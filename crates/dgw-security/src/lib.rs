// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod auth;
pub mod authz;
pub mod lockout;
pub mod rate_limit;
pub mod sanitize;
pub mod threat;

pub use auth::Authenticator;
pub use authz::authorize;
pub use lockout::LockoutTracker;
pub use rate_limit::RateLimiter;
pub use sanitize::sanitize;
pub use threat::{evaluate as evaluate_threats, ThreatSummary};
