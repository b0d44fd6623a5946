// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod cancel;
pub mod scheduler;

pub use cancel::CancellationToken;
pub use scheduler::{new_drone_states, DroneStates, Executor, ExecutorConfig};
