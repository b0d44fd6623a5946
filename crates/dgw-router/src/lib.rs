// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod mapping;
pub mod plan;
pub mod preconditions;

pub use mapping::{route, RoutingDecision};
pub use plan::{build_batch_plan, compensating_land};
pub use preconditions::{check_all, DroneState};
