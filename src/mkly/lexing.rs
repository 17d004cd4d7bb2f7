//! Lexing for the mkly format
//!
//!     The tokenizer is a stateless, line-local classifier. It maps source text to one
//!     [`LineToken`] per physical line, in order, each with its 1-based line number.
//!
//!     Since no line is classified with knowledge of its neighbours, the tokenizer never needs
//!     to know whether it is inside a block, a style section or a verbatim region. The parser
//!     owns all of that.

pub mod line_classification;

pub use line_classification::classify_line;

use crate::mkly::token::LineToken;

/// Tokenize source text into classified lines.
///
/// Both `\n` and `\r\n` terminators are accepted. A trailing terminator does not produce an
/// extra blank line.
pub fn tokenize(source: &str) -> Vec<LineToken> {
    source
        .lines()
        .enumerate()
        .map(|(index, raw)| LineToken::new(index + 1, raw, classify_line(raw)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkly::token::LineType;

    #[test]
    fn test_tokenizes_lines_with_numbers() {
        let tokens = tokenize("--- core/text\n\nHello\r\n--- /core/text\n");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].line, 1);
        assert!(matches!(tokens[0].line_type, LineType::BlockOpen { .. }));
        assert!(tokens[1].is_blank());
        assert_eq!(tokens[2].raw, "Hello");
        assert_eq!(tokens[2].line_type, LineType::Text);
        assert!(matches!(tokens[3].line_type, LineType::BlockClose { .. }));
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![]);
    }

    #[test]
    fn test_indentation_preserved() {
        let tokens = tokenize("    indented text");
        assert_eq!(tokens[0].raw, "    indented text");
        assert_eq!(tokens[0].line_type, LineType::Text);
    }
}
