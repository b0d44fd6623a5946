// SPDX-License-Identifier: MIT OR Apache-2.0
//! Input sanitization (§4.5): rejects control-character smuggling, shell
//! metacharacter injection, and path-traversal sequences before text
//! reaches the NLP engine.

const SHELL_METACHARACTERS: &[char] = &['`', '$', '|', ';', '&', '<', '>', '\\'];

/// Sanitize `text`, returning `(false, text)` unchanged if rejected, or
/// `(true, cleaned)` with control characters (other than `\n`/`\t`) removed.
#[must_use]
pub fn sanitize(text: &str) -> (bool, String) {
    if text.contains("../") || text.contains("..\\") {
        return (false, text.to_string());
    }
    if text.chars().any(|c| SHELL_METACHARACTERS.contains(&c)) {
        return (false, text.to_string());
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    (true, cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_passes_through() {
        let (ok, cleaned) = sanitize("ドローンA1を離陸させて");
        assert!(ok);
        assert_eq!(cleaned, "ドローンA1を離陸させて");
    }

    #[test]
    fn strips_embedded_control_characters() {
        let (ok, cleaned) = sanitize("前進\u{0007}して");
        assert!(ok);
        assert_eq!(cleaned, "前進して");
    }

    #[test]
    fn rejects_path_traversal() {
        let (ok, _) = sanitize("../../etc/passwd を読んで");
        assert!(!ok);
    }

    #[test]
    fn rejects_shell_metacharacters() {
        let (ok, _) = sanitize("離陸して; rm -rf /");
        assert!(!ok);
    }
}
