// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod confidence;
pub mod engine;
pub mod extract;
pub mod lexicon;
pub mod normalize;
pub mod tokenize;

pub use engine::NlpEngine;
pub use tokenize::{RuleBasedTokenizer, Tokenizer};
