// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tokenization (§4.2): a pluggable [`Tokenizer`] trait with a deterministic
//! rule-based fallback that needs no external dictionary.

use crate::lexicon;
use regex::Regex;
use std::sync::LazyLock;

/// Something that splits normalized text into tokens. Implementations may
/// wrap a real morphological analyzer; [`RuleBasedTokenizer`] is the
/// dependency-free default.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into an ordered list of tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]+(?:\.[0-9]+)?|[\p{Han}\p{Hiragana}\p{Katakana}ー]+|[A-Za-z]+").unwrap()
});

static CLAUSE_SPLIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"それから|そして|後で|、|,|それと").unwrap());

/// Deterministic, dictionary-free tokenizer: splits on digit runs, CJK
/// script runs, and ASCII letter runs, dropping particles/punctuation that
/// carry no intent-relevant signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedTokenizer;

impl Tokenizer for RuleBasedTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Split normalized input into independently-parseable clauses on common
/// Japanese conjunctions/commas (§4.2 multi-clause handling), then further
/// split any piece that still carries more than one action keyword on its
/// bare `-て`/`-で` verb-chain boundaries. A clause with neither a
/// conjunction marker nor a second action keyword returns as a
/// single-element vector.
#[must_use]
pub fn split_clauses(text: &str) -> Vec<String> {
    let parts: Vec<&str> = CLAUSE_SPLIT_PATTERN.split(text).collect();
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(split_te_chain)
        .collect()
}

/// Split a single clause further on chained `-て`/`-で` verb boundaries, for
/// input like `"接続して離陸して右に50センチ移動して"` that carries no
/// conjunction word or comma at all — each action keyword after the first
/// starts a new clause at the nearest `て`/`で` preceding it.
fn split_te_chain(clause: &str) -> Vec<String> {
    let starts = lexicon::action_keyword_starts(clause);
    if starts.len() < 2 {
        return vec![clause.to_string()];
    }

    let mut boundaries = Vec::new();
    for window in starts.windows(2) {
        let (prev, next) = (window[0], window[1]);
        let between = &clause[prev..next];
        if let Some(rel) = between.find(['て', 'で']) {
            let marker_len = between[rel..].chars().next().expect("find matched a char").len_utf8();
            boundaries.push(prev + rel + marker_len);
        }
    }

    if boundaries.is_empty() {
        return vec![clause.to_string()];
    }

    let mut out = Vec::new();
    let mut cursor = 0;
    for boundary in boundaries {
        out.push(clause[cursor..boundary].trim().to_string());
        cursor = boundary;
    }
    out.push(clause[cursor..].trim().to_string());
    out.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_mixed_digits_and_kana() {
        let tokens = RuleBasedTokenizer.tokenize("前に100cm進んで");
        assert_eq!(tokens, vec!["前に", "100", "cm", "進んで"]);
    }

    #[test]
    fn splits_on_conjunctions() {
        let clauses = split_clauses("接続して、離陸して、それから前進して");
        assert_eq!(clauses, vec!["接続して", "離陸して", "前進して"]);
    }

    #[test]
    fn single_clause_passthrough() {
        let clauses = split_clauses("離陸して");
        assert_eq!(clauses, vec!["離陸して"]);
    }

    #[test]
    fn splits_bare_te_chain_without_conjunctions() {
        let clauses = split_clauses("ドローンAAに接続して離陸して右に50センチ移動して");
        assert_eq!(
            clauses,
            vec!["ドローンAAに接続して", "離陸して", "右に50センチ移動して"]
        );
    }

    #[test]
    fn splits_bare_te_chain_with_intervening_altitude_clause() {
        let clauses = split_clauses("ドローンAAに接続して高度1メートルで右に50センチ移動して");
        assert_eq!(
            clauses,
            vec!["ドローンAAに接続して", "高度1メートルで", "右に50センチ移動して"]
        );
    }
}
