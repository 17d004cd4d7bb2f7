//! AST definitions for the mkly format
//!
//!     This module provides the document model produced by the parser and consumed by the
//!     compiler: the [`Document`] node, [`Block`]s, line [`Range`]s and [`Diagnostic`]s.
//!
//! Document and Blocks
//!
//!     A mkly document is a flat sequence of directives. The parser turns it into a tree:
//!     ordinary directives open blocks, and a close directive (`--- /type`) collapses
//!     everything opened after the matching block into its children. Special directives
//!     (meta, style, use, theme, preset, define-theme, define-preset) never become blocks;
//!     they fill the corresponding document fields.
//!
//! Location Tracking
//!
//!     The tokenizer attaches a 1-based line number to each line, and every node and
//!     diagnostic keeps the lines it came from. See [range](range).

pub mod block;
pub mod diagnostics;
pub mod document;
pub mod range;

pub use block::Block;
pub use diagnostics::{error_count, has_fatal, Diagnostic, Severity};
pub use document::{
    Comment, DefinitionKind, DirectiveLines, Document, InlineDefinition, StyleSection, DEFAULT_VERSION,
    INLINE_NAMESPACE,
};
pub use range::Range;
