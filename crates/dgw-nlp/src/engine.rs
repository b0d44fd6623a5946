// SPDX-License-Identifier: MIT OR Apache-2.0
//! The top-level NLP pipeline: normalize → split clauses → tokenize →
//! classify → extract → score (§4.2).

use crate::confidence;
use crate::extract;
use crate::lexicon;
use crate::normalize::normalize;
use crate::tokenize::{split_clauses, RuleBasedTokenizer, Tokenizer};
use dgw_core::{Action, ErrorKind, GatewayError, GatewayResult, IntentParameters, ParsedIntent};
use std::collections::BTreeMap;

/// Parses natural-language input into one [`ParsedIntent`] per clause.
///
/// Holds the process-wide kanji-numeral lexicon and confidence threshold
/// from [`dgw_core::config::NlpConfig`], plus a pluggable [`Tokenizer`]
/// (defaults to [`RuleBasedTokenizer`]).
pub struct NlpEngine {
    confidence_threshold: f64,
    kanji_lexicon: BTreeMap<String, u32>,
    tokenizer: Box<dyn Tokenizer>,
}

impl NlpEngine {
    /// Build an engine with the given threshold and lexicon, using the
    /// default dependency-free tokenizer.
    #[must_use]
    pub fn new(confidence_threshold: f64, kanji_lexicon: BTreeMap<String, u32>) -> Self {
        Self {
            confidence_threshold,
            kanji_lexicon,
            tokenizer: Box::new(RuleBasedTokenizer),
        }
    }

    /// Build an engine with a custom [`Tokenizer`] implementation (§4.2:
    /// tokenization is pluggable).
    #[must_use]
    pub fn with_tokenizer(
        confidence_threshold: f64,
        kanji_lexicon: BTreeMap<String, u32>,
        tokenizer: Box<dyn Tokenizer>,
    ) -> Self {
        Self {
            confidence_threshold,
            kanji_lexicon,
            tokenizer,
        }
    }

    /// Parse raw input into a `ParsedIntent` per detected clause, without
    /// enforcing the confidence threshold. Never calls the backend; NLP
    /// errors here are limited to malformed input (§7: NLP errors never
    /// reach C1).
    pub fn parse(&self, raw_text: &str) -> GatewayResult<Vec<ParsedIntent>> {
        if raw_text.trim().is_empty() {
            return Err(GatewayError::new(ErrorKind::InvalidArgument, "empty input")
                .with_context("reason", "empty_input"));
        }

        let normalized = normalize(raw_text, &self.kanji_lexicon)?;
        let clauses = split_clauses(&normalized);

        Ok(clauses
            .iter()
            .map(|clause| self.parse_clause(clause))
            .collect())
    }

    fn parse_clause(&self, clause: &str) -> ParsedIntent {
        let tokens = self.tokenizer.tokenize(clause);
        let action = lexicon::classify_action(clause);
        let parameters = IntentParameters {
            direction: lexicon::extract_direction(clause),
            distance_cm: extract::extract_distance_cm(clause),
            rotation_direction: lexicon::extract_rotation_direction(clause),
            angle_deg: extract::extract_angle_deg(clause),
            altitude_cm: extract::extract_altitude_cm(clause),
            duration_s: extract::extract_duration_s(clause),
            target_drone_id: extract::extract_target_drone_id(clause),
        };
        let confidence = confidence::score(action, &parameters);

        ParsedIntent {
            action,
            parameters,
            confidence,
            raw_text: clause.to_string(),
            source_tokens: tokens,
        }
    }

    /// Parse and enforce the confidence threshold: returns `low_confidence`
    /// with a `candidates` list of the distinct actions considered across
    /// clauses if any clause scores below threshold (§3 invariant:
    /// low-confidence intents never produce a `Command`).
    pub fn parse_checked(&self, raw_text: &str) -> GatewayResult<Vec<ParsedIntent>> {
        let intents = self.parse(raw_text)?;

        let low_confidence: Vec<&ParsedIntent> = intents
            .iter()
            .filter(|i| i.confidence < self.confidence_threshold)
            .collect();

        if !low_confidence.is_empty() {
            let mut candidates: Vec<String> = low_confidence
                .iter()
                .map(|i| format!("{:?}", i.action))
                .collect();
            candidates.sort();
            candidates.dedup();
            return Err(GatewayError::new(
                ErrorKind::LowConfidence,
                "could not confidently classify the request",
            )
            .with_candidates(candidates));
        }

        Ok(intents)
    }
}
