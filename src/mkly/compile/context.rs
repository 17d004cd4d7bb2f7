//! Per-compile state
//!
//!     One [`CompileContext`] lives for exactly one compile call. Renderers receive it
//!     mutably: they read the cascaded variables and the merged style graph, record
//!     diagnostics, and contribute CSS, which is deduplicated here.

use crate::mkly::ast::{Block, Diagnostic};
use crate::mkly::style::variables::{substitute, VariableMap, VariableMode};
use crate::mkly::style::StyleGraph;

#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    /// Effective document version
    pub version: u32,
    /// Kit and theme defaults < style-section variables < caller overrides
    pub variables: VariableMap,
    pub variable_mode: VariableMode,
    pub style_graph: StyleGraph,
    pub diagnostics: Vec<Diagnostic>,
    block_css: Vec<String>,
}

impl CompileContext {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.variables.get(name).map(String::as_str)
    }

    /// Rewrite `$name` references in a CSS value according to the variable mode.
    pub fn css_value(&self, value: &str) -> String {
        substitute(value, self.variable_mode, &self.variables)
    }

    /// Record a warning about a block.
    pub fn warn(&mut self, block: &Block, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::warning(block.range.start, message).with_block(block.block_type.clone()),
        );
    }

    /// Record a non-fatal error about a block.
    pub fn error(&mut self, block: &Block, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::error(block.range.start, message).with_block(block.block_type.clone()),
        );
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add block CSS for the kit layer. Returns false when the same CSS is already present.
    pub fn add_css(&mut self, css: &str) -> bool {
        let css = css.trim();
        if css.is_empty() || self.block_css.iter().any(|existing| existing == css) {
            return false;
        }
        self.block_css.push(css.to_string());
        true
    }

    pub fn block_css(&self) -> &[String] {
        &self.block_css
    }
}
