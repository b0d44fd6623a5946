// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! Allow missing docs on the binary-facing config loader and argument
//! mapper; their substantive behavior is documented at the function level.
#![allow(clippy::module_name_repetitions)]

pub mod arguments;
pub mod config_loader;
pub mod server;

pub use server::Server;
