//! Line Classification
//!
//! Core classification logic for determining line types. Classification is a pure function of
//! one line: the order of the checks below is the precedence order.
use crate::mkly::token::{LineType, COMMENT_MARKER, DIRECTIVE_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;

/// Type names: `name` or `kit/name`, letters first, then word characters and dashes.
const TYPE_NAME: &str = r"[A-Za-z][\w-]*(?:/[A-Za-z][\w-]*)?";

static CLOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{}\s*/\s*({})\s*$", DIRECTIVE_MARKER, TYPE_NAME))
        .expect("close directive pattern is valid")
});

static OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{}\s*({})\s*(?::\s*(.*?))?\s*$",
        DIRECTIVE_MARKER, TYPE_NAME
    ))
    .expect("open directive pattern is valid")
});

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([@$]?[A-Za-z_][\w.-]*)[ \t]*:(?:[ \t]+(.*))?$")
        .expect("property pattern is valid")
});

/// Determine the type of a line.
pub fn classify_line(raw: &str) -> LineType {
    if is_blank_line(raw) {
        return LineType::Blank;
    }
    if let Some(text) = comment_text(raw) {
        return LineType::Comment { text };
    }
    if let Some(caps) = CLOSE_RE.captures(raw) {
        return LineType::BlockClose {
            name: caps[1].to_string(),
        };
    }
    if let Some(caps) = OPEN_RE.captures(raw) {
        let label = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|l| !l.is_empty());
        return LineType::BlockOpen {
            name: caps[1].to_string(),
            label,
        };
    }
    if let Some(caps) = PROPERTY_RE.captures(raw) {
        let value = caps
            .get(2)
            .map(|m| m.as_str().trim_end().to_string())
            .unwrap_or_default();
        return LineType::Property {
            key: caps[1].to_string(),
            value,
        };
    }
    LineType::Text
}

/// Check if line is blank (only whitespace)
fn is_blank_line(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Comment body if the line starts (after indentation) with the comment marker
fn comment_text(raw: &str) -> Option<String> {
    raw.trim_start()
        .strip_prefix(COMMENT_MARKER)
        .map(|rest| rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", LineType::Blank)]
    #[case("   \t", LineType::Blank)]
    #[case("  // note", LineType::Comment { text: "note".to_string() })]
    #[case("--- /core/section", LineType::BlockClose { name: "core/section".to_string() })]
    #[case("---/card", LineType::BlockClose { name: "card".to_string() })]
    #[case("--- core/text", LineType::BlockOpen { name: "core/text".to_string(), label: None })]
    #[case("--- use: newsletter", LineType::BlockOpen { name: "use".to_string(), label: Some("newsletter".to_string()) })]
    #[case("--- core/card: featured", LineType::BlockOpen { name: "core/card".to_string(), label: Some("featured".to_string()) })]
    #[case("--- meta:", LineType::BlockOpen { name: "meta".to_string(), label: None })]
    #[case("url: https://example.com/a:b", LineType::Property { key: "url".to_string(), value: "https://example.com/a:b".to_string() })]
    #[case("alt:", LineType::Property { key: "alt".to_string(), value: String::new() })]
    #[case("https://example.com", LineType::Text)]
    #[case("  color: red", LineType::Text)]
    #[case("----", LineType::Text)]
    #[case("Hello world", LineType::Text)]
    fn test_classify_line(#[case] raw: &str, #[case] expected: LineType) {
        assert_eq!(classify_line(raw), expected);
    }

    #[test]
    fn test_comment_wins_over_directive() {
        assert!(matches!(
            classify_line("// --- core/text"),
            LineType::Comment { .. }
        ));
    }

    #[test]
    fn test_reserved_prefix_is_still_a_property_token() {
        assert_eq!(
            classify_line("@color: red"),
            LineType::Property {
                key: "@color".to_string(),
                value: "red".to_string()
            }
        );
    }
}
