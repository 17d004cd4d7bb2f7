//! The active accumulator
//!
//!     At any point the parser is collecting lines for at most one thing: an ordinary block or
//!     one special directive. That is modelled as a single tagged value, moved into each step of
//!     the parse loop and returned from it, instead of a set of per-directive buffers.

use super::directive::Directive;
use crate::mkly::ast::Block;
use crate::mkly::token::LineToken;

/// Parser state while an ordinary block is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// Leading `key: value` lines set properties
    Properties,
    /// After the first text or blank line, everything is content
    Content,
    /// Kit-declared verbatim type: everything up to the exact close marker is captured raw
    Verbatim,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Nothing open
    Idle,

    /// An ordinary block being filled
    Block {
        block: Block,
        state: BlockState,
        lines: Vec<String>,
    },

    /// A special directive collecting its lines
    Special {
        directive: Directive,
        label: Option<String>,
        line: usize,
        lines: Vec<LineToken>,
    },
}

impl Accumulator {
    pub fn special(directive: Directive, label: Option<String>, line: usize) -> Self {
        Accumulator::Special {
            directive,
            label,
            line,
            lines: Vec::new(),
        }
    }
}

/// Drop leading and trailing blank lines, keeping inner ones.
pub fn trim_blank_lines<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let start = lines
        .iter()
        .position(|l| !l.as_ref().trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.as_ref().trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    &lines[start..end]
}

/// Same as [`trim_blank_lines`] for tokens.
pub fn trim_blank_tokens(lines: &[LineToken]) -> &[LineToken] {
    let start = lines
        .iter()
        .position(|l| !l.is_blank())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_blank())
        .map(|i| i + 1)
        .unwrap_or(start);
    &lines[start..end]
}
