// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod client;
pub mod retry;
pub mod status;

pub use client::BackendClient;
pub use retry::{RetryMetadata, RetryPolicy};
pub use status::map_status;
