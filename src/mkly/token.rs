//! Core token types shared by the tokenizer and the parser.
//!
//!     The grammar operates over lines, so there is a single token layer: one
//!     [`LineToken`] per physical line. See [line](line) module.

pub mod line;

pub use line::{LineToken, LineType};

/// Marker that starts every directive line.
pub const DIRECTIVE_MARKER: &str = "---";

/// Marker that starts a comment line.
pub const COMMENT_MARKER: &str = "//";
