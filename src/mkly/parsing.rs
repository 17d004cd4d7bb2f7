//! Parsing module for the mkly format
//!
//!     This module provides the processing pipeline from source text to the document AST:
//!         1. Lexing: one classified token per line. See [lexing](crate::mkly::lexing) module.
//!         2. Parsing: a finite-state machine over the tokens. See [parser](parser) module.
//!
//! Directives
//!
//!     A directive line is `--- name` (optionally `--- name: label`) and a close is
//!     `--- /name`. The special directive names are meta, style, use, theme, preset,
//!     define-theme and define-preset; any other name opens an ordinary content block:
//!
//!         --- use: core
//!
//!         --- meta
//!         version: 2
//!         title: Weekly digest
//!
//!         --- core/section
//!         --- core/heading
//!         level: 1
//!
//!         This week
//!         --- core/text
//!
//!         Hello
//!         --- /core/section
//!
//!     Special directives follow a canonical phase order; see [directive](directive).
//!
//! Limits
//!
//!     Both the size of the source and the number of blocks are bounded (see
//!     [`ParseOptions`]). Exceeding either produces a single fatal error: an oversized source
//!     is not parsed at all, and a block-count overflow truncates parsing at the offending line.
//!     Nesting depth is bounded too, but only with a warning: closes past the ceiling are not
//!     applied.

pub mod accumulator;
pub mod directive;
pub mod parser;

pub use directive::{Directive, Phase};
pub use parser::RESERVED_STYLE_PREFIX;

use crate::mkly::ast::{Diagnostic, Document};
use crate::mkly::kit::Kit;
use crate::mkly::lexing::tokenize;
use crate::mkly::token::LineToken;
use std::collections::BTreeSet;

/// Default bound on source size in bytes.
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// Default bound on the number of blocks in a document.
pub const DEFAULT_MAX_BLOCKS: usize = 5000;

/// Default bound on the height of the block tree.
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Knobs for a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_source_bytes: usize,
    pub max_blocks: usize,
    /// Closes that would nest blocks deeper than this leave them unnested
    pub max_nesting: usize,
    /// Block types whose body is captured verbatim until the exact close marker.
    pub verbatim_types: BTreeSet<String>,
}

impl ParseOptions {
    /// Options whose verbatim types come from the given kits.
    pub fn for_kits<'a>(kits: impl IntoIterator<Item = &'a Kit>) -> Self {
        let mut options = Self {
            verbatim_types: BTreeSet::new(),
            ..Self::default()
        };
        for kit in kits {
            options.verbatim_types.extend(kit.verbatim_types());
        }
        options
    }

    pub fn is_verbatim(&self, block_type: &str) -> bool {
        self.verbatim_types.contains(block_type)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_blocks: DEFAULT_MAX_BLOCKS,
            max_nesting: DEFAULT_MAX_NESTING,
            verbatim_types: crate::mkly::kit::builtin::core_kit().verbatim_types(),
        }
    }
}

/// Parse source text into a document.
///
/// Never fails: problems are reported as diagnostics on the returned document.
pub fn parse_document(source: &str, options: &ParseOptions) -> Document {
    if source.len() > options.max_source_bytes {
        let mut doc = Document::new();
        doc.diagnostics.push(
            Diagnostic::fatal(
                1,
                format!(
                    "Document is {} bytes, exceeding the maximum of {} bytes",
                    source.len(),
                    options.max_source_bytes
                ),
            )
            .with_code("source-too-large"),
        );
        return doc;
    }
    log::debug!("parsing {} bytes", source.len());
    parse_tokens(tokenize(source), options)
}

/// Parse an already tokenized document.
pub fn parse_tokens(tokens: Vec<LineToken>, options: &ParseOptions) -> Document {
    parser::Parser::new(options).run(tokens)
}
