//! Token definitions for style text
//!
//!     Both style dialects and all CSS values go through this lexer. It is not a CSS tokenizer:
//!     it only knows enough to tell quoted strings, `url(...)` bodies and comments apart from
//!     the rest, so that braces, `//` and `$name` inside them are never misread.
//!
//!     The helpers below work on the token stream and reassemble text from the original
//!     slices, so anything the lexer does not understand passes through unchanged.

use logos::Logos;
use std::ops::Range;

/// Tokens of the style sub-language
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleToken {
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    Str,

    #[regex(r"url\([^)\n]*\)")]
    Url,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"\\.")]
    Escape,

    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("/")]
    Slash,

    /// `$name` variable reference
    #[regex(r"\$[A-Za-z_][\w-]*")]
    Variable,

    /// Function opener including the paren, e.g. `rgba(`
    #[regex(r"-?[A-Za-z_][\w-]*\(")]
    Function,

    #[regex(r#"[^\s{}()"'$\\/;:,]+"#)]
    Word,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

impl StyleToken {
    pub fn is_comment(&self) -> bool {
        matches!(self, StyleToken::LineComment | StyleToken::BlockComment)
    }
}

/// Lex style text into tokens with their byte spans.
///
/// Input the patterns reject (a lone `$`, an unterminated quote) comes back as a word.
pub fn tokenize(text: &str) -> Vec<(StyleToken, Range<usize>)> {
    StyleToken::lexer(text)
        .spanned()
        .map(|(token, span)| (token.unwrap_or(StyleToken::Word), span))
        .collect()
}

/// Whether the text contains a brace outside strings, comments and escapes.
///
/// This decides between the brace dialect and the indentation dialect.
pub fn has_unescaped_brace(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|(token, _)| matches!(token, StyleToken::OpenBrace | StyleToken::CloseBrace))
}

/// Remove `//` and `/* */` comments that are not inside strings or `url(...)`.
pub fn strip_comments(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .filter(|(token, _)| !token.is_comment())
        .map(|(_, span)| &text[span])
        .collect::<String>()
        .trim()
        .to_string()
}

/// Names of the functions called in a value, without the opening paren.
pub fn function_names(value: &str) -> Vec<&str> {
    tokenize(value)
        .into_iter()
        .filter(|(token, _)| *token == StyleToken::Function)
        .map(|(_, span)| value[span.start..span.end - 1].trim_start_matches('-'))
        .collect()
}

/// Names of the `$name` references in a value, without the sigil.
pub fn variable_references(value: &str) -> Vec<&str> {
    tokenize(value)
        .into_iter()
        .filter(|(token, _)| *token == StyleToken::Variable)
        .map(|(_, span)| &value[span.start + 1..span.end])
        .collect()
}

/// Rewrite every `$name` reference the callback resolves; the rest is left as written.
pub fn replace_variables<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    for (token, span) in tokenize(text) {
        let slice = &text[span];
        match token {
            StyleToken::Variable => match resolve(&slice[1..]) {
                Some(replacement) => out.push_str(&replacement),
                None => out.push_str(slice),
            },
            _ => out.push_str(slice),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<StyleToken> {
        tokenize(text)
            .into_iter()
            .map(|(token, _)| token)
            .filter(|t| *t != StyleToken::Whitespace)
            .collect()
    }

    #[test]
    fn test_declaration_tokens() {
        assert_eq!(
            kinds("color: $accent;"),
            vec![
                StyleToken::Word,
                StyleToken::Colon,
                StyleToken::Variable,
                StyleToken::Semicolon
            ]
        );
    }

    #[test]
    fn test_url_and_strings_hide_special_characters() {
        assert_eq!(
            kinds("url(http://example.com/{a}) \"{ // }\""),
            vec![StyleToken::Url, StyleToken::Str]
        );
    }

    #[test]
    fn test_brace_detection() {
        assert!(has_unescaped_brace(".a { color: red; }"));
        assert!(!has_unescaped_brace(".a\n  content: \"{\"\n"));
        assert!(!has_unescaped_brace("// { not a brace }\ncore/text\n  color: red"));
        assert!(!has_unescaped_brace("/* { */ core/text"));
        assert!(!has_unescaped_brace(r"content: \{"));
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("red // the accent"), "red");
        assert_eq!(strip_comments("1px /* thin */ solid"), "1px  solid");
        assert_eq!(
            strip_comments("url(https://cdn.example.com/a.png)"),
            "url(https://cdn.example.com/a.png)"
        );
    }

    #[test]
    fn test_function_names() {
        assert_eq!(
            function_names("darken($accent, 10%) rgba(0,0,0,.5)"),
            vec!["darken", "rgba"]
        );
    }

    #[test]
    fn test_replace_variables() {
        let out = replace_variables("1px solid $border $unknown", |name| {
            (name == "border").then(|| "#ddd".to_string())
        });
        assert_eq!(out, "1px solid #ddd $unknown");
        assert_eq!(variable_references("$a $b-c"), vec!["a", "b-c"]);
    }
}
