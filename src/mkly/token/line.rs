//! Line token types
//!
//!     mkly is parsed line by line, and all the parser needs is one classified record per
//!     physical line. The tokenizer decides the category from the line alone: there is no
//!     lookahead and no parser state involved, so a line that looks like a property is a
//!     property token even inside content. The parser decides what a token means in context
//!     (inside content, a property token is ordinary text; inside a verbatim block, every token
//!     is captured raw).
//!
//! Line Types
//!
//!     In classification precedence order (first match wins):
//!
//!         - Blank: empty or whitespace only
//!         - Comment: `//` after optional indentation
//!         - BlockClose: `--- /type`
//!         - BlockOpen: `--- type` or `--- type: label`
//!         - Property: `key: value`, the first colon is significant
//!         - Text: anything else, indentation preserved verbatim
//!
//!     See [classify_line](crate::mkly::lexing::line_classification::classify_line) for the
//!     classification logic.

use serde::Serialize;
use std::fmt;

/// One classified physical line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineToken {
    /// 1-based line number
    pub line: usize,

    /// The line exactly as written, without its line terminator
    pub raw: String,

    /// The classification of this line
    pub line_type: LineType,
}

impl LineToken {
    pub fn new(line: usize, raw: impl Into<String>, line_type: LineType) -> Self {
        Self {
            line,
            raw: raw.into(),
            line_type,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.line_type, LineType::Blank)
    }
}

/// The classification of a line token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LineType {
    /// Empty or whitespace-only line
    Blank,

    /// Comment line; `text` excludes the marker
    Comment { text: String },

    /// `--- /type`
    BlockClose { name: String },

    /// `--- name` or `--- name: label`
    BlockOpen { name: String, label: Option<String> },

    /// `key: value`
    Property { key: String, value: String },

    /// Any other line
    Text,
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineType::Blank => write!(f, "BLANK"),
            LineType::Comment { .. } => write!(f, "COMMENT"),
            LineType::BlockClose { .. } => write!(f, "CLOSE"),
            LineType::BlockOpen { .. } => write!(f, "OPEN"),
            LineType::Property { .. } => write!(f, "PROPERTY"),
            LineType::Text => write!(f, "TEXT"),
        }
    }
}
