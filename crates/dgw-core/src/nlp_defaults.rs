// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default kanji-numeral lexicon used when `nlp.kanji_numeral_lexicon` is
//! left unset. Covers single kanji digits only; compound numerals (e.g.
//! "二十五") are deliberately left to `dgw-nlp`'s normalization pass rather
//! than enumerated here.

use std::collections::BTreeMap;

/// The built-in single-digit kanji numeral table.
#[must_use]
pub fn default_kanji_lexicon() -> BTreeMap<String, u32> {
    [
        ("〇", 0),
        ("一", 1),
        ("二", 2),
        ("三", 3),
        ("四", 4),
        ("五", 5),
        ("六", 6),
        ("七", 7),
        ("八", 8),
        ("九", 9),
        ("十", 10),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_covers_zero_through_ten() {
        let lex = default_kanji_lexicon();
        assert_eq!(lex.get("一"), Some(&1));
        assert_eq!(lex.get("十"), Some(&10));
        assert_eq!(lex.len(), 11);
    }
}
