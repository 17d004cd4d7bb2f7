//! Brace dialect
//!
//!     The older CSS-like form of style text:
//!
//!         $accent: #e11d48;
//!
//!         core/card {
//!           padding: 16px;
//!           &:hover { color: $accent; }
//!           .img { border-radius: 8px; }
//!         }
//!
//!         .promo { color: red; }
//!
//!     Top-level selectors and nested selectors follow the same grammar as the indentation
//!     dialect (nested ones may carry a leading `&`), so both dialects produce identical
//!     graphs. Declarations outside any selector are variables.
//!
//!     A nested selector refines the frame around it, so `.img { &:hover { } }` targets the
//!     hovered `img` element rather than the hovered block.

use super::{check_value, clean_value, parse_declaration, parse_header, parse_sub_target, Header};
use crate::mkly::style::graph::{StyleGraph, StyleWarning, Target};
use crate::mkly::style::lexer::{tokenize, StyleToken};

struct Frame {
    header: Header,
    target: Target,
}

struct BraceParser {
    graph: StyleGraph,
    stack: Vec<Frame>,
    buffer: String,
    buffer_line: usize,
    line: usize,
}

impl BraceParser {
    fn new() -> Self {
        Self {
            graph: StyleGraph::new(),
            stack: Vec::new(),
            buffer: String::new(),
            buffer_line: 1,
            line: 1,
        }
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.graph.warnings.push(StyleWarning::new(line, message));
    }

    fn push_text(&mut self, slice: &str) {
        if self.buffer.trim().is_empty() && !slice.trim().is_empty() {
            self.buffer_line = self.line;
        }
        self.buffer.push_str(slice);
    }

    fn take_buffer(&mut self) -> String {
        let text = std::mem::take(&mut self.buffer);
        text.replace(['\n', '\r'], " ").trim().to_string()
    }

    fn open(&mut self) {
        let line = self.buffer_line;
        let prelude = self.take_buffer();
        let frame = match self.stack.last() {
            None => {
                let header = parse_header(&prelude, line, &mut self.graph.warnings);
                let target = header.base_target();
                Frame { header, target }
            }
            Some(outer) => {
                let header = outer.header.clone();
                let nested = prelude.trim_start_matches('&').trim_start();
                let target = parse_sub_target(nested)
                    .and_then(|sub| header.nested_target(&outer.target, &sub));
                let target = match target {
                    Some(target) => target,
                    None => {
                        let target = outer.target.clone();
                        self.warn(
                            line,
                            format!("Unsupported nested selector '{}'; its rules apply to the outer selector", prelude),
                        );
                        target
                    }
                };
                Frame { header, target }
            }
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        self.declaration();
        if self.stack.pop().is_none() {
            let line = self.line;
            self.warn(line, "Unmatched '}'");
        }
    }

    fn declaration(&mut self) {
        let line = self.buffer_line;
        let text = self.take_buffer();
        if text.is_empty() {
            return;
        }
        match self.stack.last() {
            None => {
                let text = text.strip_prefix('$').unwrap_or(&text);
                match parse_declaration(text) {
                    Some((name, value)) => {
                        check_value(&value, line, &mut self.graph.warnings);
                        self.graph.put_variable(&name, &value);
                    }
                    None => self.warn(line, format!("Unrecognized style text: '{}'", text)),
                }
            }
            Some(frame) => {
                let key = frame.header.key(frame.target.clone());
                match parse_declaration(&text) {
                    Some((property, value)) => {
                        check_value(&value, line, &mut self.graph.warnings);
                        self.graph.absorb(key, &[(property, clean_value(&value))]);
                    }
                    None => self.warn(line, format!("Unrecognized declaration: '{}'", text)),
                }
            }
        }
    }
}

/// Parse the brace dialect.
pub fn parse_braces(text: &str) -> StyleGraph {
    let mut parser = BraceParser::new();
    let mut paren_depth = 0usize;

    for (token, span) in tokenize(text) {
        let slice = &text[span];
        match token {
            StyleToken::LineComment | StyleToken::BlockComment => {}
            StyleToken::OpenBrace => parser.open(),
            StyleToken::CloseBrace => parser.close(),
            StyleToken::Semicolon if paren_depth == 0 => parser.declaration(),
            StyleToken::Function | StyleToken::OpenParen => {
                paren_depth += 1;
                parser.push_text(slice);
            }
            StyleToken::CloseParen => {
                paren_depth = paren_depth.saturating_sub(1);
                parser.push_text(slice);
            }
            _ => parser.push_text(slice),
        }
        parser.line += slice.matches('\n').count();
    }

    parser.declaration();
    if !parser.stack.is_empty() {
        let line = parser.line;
        parser.warn(line, "Unclosed '{' at end of style text");
    }
    parser.graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkly::style::graph::RuleKey;
    use crate::mkly::style::parser::parse_indented;

    #[test]
    fn test_brace_dialect_matches_indentation_dialect() {
        let braces = parse_braces(
            "$accent: #e11d48;\ncore/card {\n  padding: 16px;\n  &:hover { color: $accent; }\n  .img { border-radius: 8px; }\n}\n.promo { color: red; }",
        );
        let indented = parse_indented(
            "accent: #e11d48\ncore/card\n  padding: 16px\n  :hover\n    color: $accent\n  .img\n    border-radius: 8px\n.promo\n  color: red",
        );
        assert_eq!(braces.variables, indented.variables);
        assert_eq!(braces.rules, indented.rules);
        assert!(braces.warnings.is_empty());
    }

    #[test]
    fn test_semicolons_inside_functions_do_not_split() {
        let graph = parse_braces(".a { background: url(data:image/png;base64,AAA); color: red }");
        let rule = graph.rule(&RuleKey::raw(".a")).expect("rule");
        assert_eq!(rule.property("background"), Some("url(data:image/png;base64,AAA)"));
        assert_eq!(rule.property("color"), Some("red"));
    }

    #[test]
    fn test_unbalanced_braces_warn() {
        let graph = parse_braces("core/text { color: red; }\n}");
        assert_eq!(graph.warnings.len(), 1);
        assert_eq!(graph.warnings[0].line, 2);
        assert_eq!(graph.rules.len(), 1);
    }

    #[test]
    fn test_nested_frames_refine_the_outer_target() {
        let graph = parse_braces(
            "core/card {\n  .img {\n    width: 100%;\n    &:hover { opacity: 0.8; }\n  }\n  >a { &:hover { color: red; } }\n}\n.promo { .title { &:hover { color: blue; } } }",
        );
        assert!(graph.warnings.is_empty(), "{:?}", graph.warnings);
        let img_hover = RuleKey::new("core/card").with_target(Target::Element {
            name: "img".to_string(),
            pseudo: Some(":hover".to_string()),
        });
        assert_eq!(graph.rule(&img_hover).and_then(|r| r.property("opacity")), Some("0.8"));
        let img = RuleKey::new("core/card").with_target(Target::element("img"));
        assert_eq!(graph.rule(&img).and_then(|r| r.property("width")), Some("100%"));
        let link_hover = RuleKey::new("core/card").with_target(Target::descendant("a:hover"));
        assert_eq!(graph.rule(&link_hover).and_then(|r| r.property("color")), Some("red"));
        let title_hover = RuleKey::raw(".promo .title:hover");
        assert_eq!(graph.rule(&title_hover).and_then(|r| r.property("color")), Some("blue"));
    }

    #[test]
    fn test_unsupported_nesting_keeps_the_outer_target() {
        let graph = parse_braces("core/card { .img { .caption { color: red; } } }");
        assert_eq!(graph.warnings.len(), 1);
        let img = RuleKey::new("core/card").with_target(Target::element("img"));
        assert_eq!(graph.rule(&img).and_then(|r| r.property("color")), Some("red"));
    }

    #[test]
    fn test_comments_are_ignored() {
        let graph = parse_braces("/* brand */\ncore/text {\n  color: red; // main\n}");
        let rule = graph.rule(&RuleKey::new("core/text")).expect("rule");
        assert_eq!(rule.properties, vec![("color".to_string(), "red".to_string())]);
    }
}
