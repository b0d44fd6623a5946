// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod frame;
pub mod lifecycle;
pub mod schema;

pub use catalog::Catalog;
pub use frame::{JsonRpcCodec, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use lifecycle::ServerState;
pub use schema::validate_arguments;
