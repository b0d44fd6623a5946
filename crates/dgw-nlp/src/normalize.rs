// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text normalization: NFKC-equivalent fullwidth folding, number-word
//! normalization, control-character rejection (§4.2).

use dgw_core::{ErrorKind, GatewayError, GatewayResult};
use std::collections::BTreeMap;

/// Maximum accepted input size, in bytes, per §4.2.
pub const MAX_INPUT_BYTES: usize = 4096;

/// Fold a fullwidth digit (U+FF10..=U+FF19) to its halfwidth equivalent.
fn fold_fullwidth_digit(c: char) -> Option<char> {
    let cp = c as u32;
    if (0xFF10..=0xFF19).contains(&cp) {
        char::from_u32(cp - 0xFF10 + u32::from('0'))
    } else {
        None
    }
}

/// Fold fullwidth ASCII punctuation/letters (U+FF01..=U+FF5E) to their
/// halfwidth equivalents — the narrow slice of NFKC compatibility folding
/// this pipeline actually depends on.
fn fold_fullwidth_ascii(c: char) -> Option<char> {
    let cp = c as u32;
    if (0xFF01..=0xFF5E).contains(&cp) {
        char::from_u32(cp - 0xFF01 + u32::from('!'))
    } else if cp == 0x3000 {
        Some(' ')
    } else {
        None
    }
}

/// Reject control characters other than a small allowlist (none, currently —
/// multi-line input is not a supported shape for a single command utterance).
fn is_rejected_control(c: char) -> bool {
    c.is_control()
}

/// Replace runs of kanji numerals with their decimal digit-string equivalent,
/// using the configured lexicon. Supports single digits and `十`-scaled
/// compounds (`二十五` → `25`); anything outside that shape is left alone so
/// downstream tokenization can still see the original text.
fn normalize_kanji_numbers(text: &str, lexicon: &BTreeMap<String, u32>) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if let Some(run_len) = longest_kanji_numeral_run(&chars[i..], lexicon) {
            if let Some(value) = parse_kanji_run(&chars[i..i + run_len], lexicon) {
                out.push_str(&value.to_string());
                i += run_len;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn longest_kanji_numeral_run(chars: &[char], lexicon: &BTreeMap<String, u32>) -> Option<usize> {
    let mut len = 0;
    for c in chars {
        if lexicon.contains_key(&c.to_string()) {
            len += 1;
        } else {
            break;
        }
    }
    if len > 0 {
        Some(len)
    } else {
        None
    }
}

/// Parse a contiguous run of kanji-numeral characters. Handles a leading
/// digit followed by `十` (scale by ten) and an optional trailing digit, or a
/// bare run of digits read as individual places is intentionally not
/// supported — this pipeline only targets the small-number vocabulary a
/// drone command actually uses (distances, angles, counts).
fn parse_kanji_run(run: &[char], lexicon: &BTreeMap<String, u32>) -> Option<u32> {
    let values: Vec<u32> = run
        .iter()
        .map(|c| lexicon.get(&c.to_string()).copied())
        .collect::<Option<Vec<_>>>()?;

    match values.as_slice() {
        [v] => Some(*v),
        [tens, 10] if *tens != 10 => Some(tens * 10),
        [10, ones] if *ones != 10 => Some(10 + ones),
        [tens, 10, ones] if *tens != 10 && *ones != 10 => Some(tens * 10 + ones),
        _ => None,
    }
}

/// Normalize raw input text: fullwidth folding, kanji-numeral substitution,
/// whitespace collapsing, control-character rejection.
///
/// Returns `invalid_argument` if the input exceeds [`MAX_INPUT_BYTES`] or
/// contains a rejected control character.
pub fn normalize(text: &str, kanji_lexicon: &BTreeMap<String, u32>) -> GatewayResult<String> {
    if text.as_bytes().len() > MAX_INPUT_BYTES {
        return Err(GatewayError::new(
            ErrorKind::InvalidArgument,
            format!("input exceeds {MAX_INPUT_BYTES} bytes"),
        ));
    }

    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        if is_rejected_control(c) && c != '\n' && c != '\t' {
            return Err(GatewayError::new(
                ErrorKind::InvalidArgument,
                "input contains a rejected control character",
            ));
        }
        if let Some(d) = fold_fullwidth_digit(c) {
            folded.push(d);
        } else if let Some(a) = fold_fullwidth_ascii(c) {
            folded.push(a);
        } else {
            folded.push(c);
        }
    }

    let with_numbers = normalize_kanji_numbers(&folded, kanji_lexicon);
    let collapsed = with_numbers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Ok(collapsed.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgw_core::nlp_defaults::default_kanji_lexicon;

    #[test]
    fn folds_fullwidth_digits() {
        let lex = default_kanji_lexicon();
        assert_eq!(normalize("１００ｃｍ前進", &lex).unwrap(), "100cm前進");
    }

    #[test]
    fn rejects_control_characters() {
        let lex = default_kanji_lexicon();
        let err = normalize("前進\u{0007}", &lex).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_oversized_input() {
        let lex = default_kanji_lexicon();
        let huge = "あ".repeat(MAX_INPUT_BYTES);
        let err = normalize(&huge, &lex).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn converts_single_kanji_digit() {
        let lex = default_kanji_lexicon();
        assert_eq!(normalize("五メートル前進", &lex).unwrap(), "5メートル前進");
    }

    #[test]
    fn converts_compound_kanji_tens() {
        let lex = default_kanji_lexicon();
        assert_eq!(normalize("二十五度回転", &lex).unwrap(), "25度回転");
        assert_eq!(normalize("十度", &lex).unwrap(), "10度");
        assert_eq!(normalize("三十", &lex).unwrap(), "30");
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let lex = default_kanji_lexicon();
        assert_eq!(normalize("前進  して", &lex).unwrap(), "前進 して");
    }
}
