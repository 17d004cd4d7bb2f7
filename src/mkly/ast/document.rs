//! The document node
//!
//!     A [`Document`] is produced once by parsing and is read-only afterwards. Whole-document
//!     transforms (kit or plugin hooks) take a document by value and return a new one.
//!
//!     Besides the block tree, the document keeps everything the directives declared: the
//!     version, meta mapping, raw style-section text (parsed later, once per section), kit
//!     `use` names, referenced theme and preset names, inline theme/preset definitions,
//!     comments and the parse diagnostics. The lines those declarations came from are kept in
//!     [`DirectiveLines`] for diagnostics raised after parsing.

use super::block::Block;
use super::diagnostics::{has_fatal, Diagnostic};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Version assumed at parse time when the document declares none.
pub const DEFAULT_VERSION: u32 = 1;

/// Namespace given to themes and presets defined inside a document.
pub const INLINE_NAMESPACE: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Document {
    /// Declared version, `None` when the meta section does not set a valid one.
    pub version: Option<u32>,
    pub blocks: Vec<Block>,
    pub meta: BTreeMap<String, String>,
    pub styles: Vec<StyleSection>,
    pub uses: Vec<String>,
    pub themes: Vec<String>,
    pub presets: Vec<String>,
    pub definitions: Vec<InlineDefinition>,
    pub comments: Vec<Comment>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub lines: DirectiveLines,
}

/// Source lines of directive declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectiveLines {
    /// Line of the `version` meta property that set [`Document::version`]
    pub version: Option<usize>,
    pub uses: BTreeMap<String, usize>,
    pub themes: BTreeMap<String, usize>,
    pub presets: BTreeMap<String, usize>,
}

/// Documents built in code have no source lines; their diagnostics point at line 1.
fn declared_line(lines: &BTreeMap<String, usize>, name: &str) -> usize {
    lines.get(name).copied().unwrap_or(1)
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The declared version, or [`DEFAULT_VERSION`].
    pub fn version(&self) -> u32 {
        self.version.unwrap_or(DEFAULT_VERSION)
    }

    /// Whether parsing hit a fatal limit.
    pub fn is_fatal(&self) -> bool {
        has_fatal(&self.diagnostics)
    }

    /// Line of the `use` directive that named a kit.
    pub fn use_line(&self, name: &str) -> usize {
        declared_line(&self.lines.uses, name)
    }

    /// Line of the `theme` or `preset` directive that named `name`.
    pub fn reference_line(&self, kind: DefinitionKind, name: &str) -> usize {
        match kind {
            DefinitionKind::Theme => declared_line(&self.lines.themes, name),
            DefinitionKind::Preset => declared_line(&self.lines.presets, name),
        }
    }

    /// Line of the declared version, 1 when the version is absent.
    pub fn version_line(&self) -> usize {
        self.lines.version.unwrap_or(1)
    }

    pub fn definition(&self, kind: DefinitionKind, name: &str) -> Option<&InlineDefinition> {
        self.definitions
            .iter()
            .find(|d| d.kind == kind && d.matches(name))
    }
}

/// Raw text of one `--- style` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleSection {
    pub text: String,
    /// Line of the first text line, used to offset style diagnostics.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Theme,
    Preset,
}

impl DefinitionKind {
    pub fn directive(&self) -> &'static str {
        match self {
            DefinitionKind::Theme => "define-theme",
            DefinitionKind::Preset => "define-preset",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Theme => write!(f, "theme"),
            DefinitionKind::Preset => write!(f, "preset"),
        }
    }
}

/// A theme or preset defined inline with `--- define-theme: name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineDefinition {
    pub kind: DefinitionKind,
    pub name: String,
    pub variables: Vec<(String, String)>,
    pub body: String,
    pub line: usize,
}

impl InlineDefinition {
    /// Name under the synthetic namespace, e.g. `custom/brand`.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", INLINE_NAMESPACE, self.name)
    }

    pub fn matches(&self, name: &str) -> bool {
        name == self.name || name == self.qualified_name()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defaults() {
        let mut doc = Document::new();
        assert_eq!(doc.version(), DEFAULT_VERSION);
        doc.version = Some(2);
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_definition_lookup_accepts_namespace() {
        let mut doc = Document::new();
        doc.definitions.push(InlineDefinition {
            kind: DefinitionKind::Theme,
            name: "brand".to_string(),
            variables: vec![("accent".to_string(), "#e11d48".to_string())],
            body: String::new(),
            line: 1,
        });
        assert!(doc.definition(DefinitionKind::Theme, "brand").is_some());
        assert!(doc.definition(DefinitionKind::Theme, "custom/brand").is_some());
        assert!(doc.definition(DefinitionKind::Preset, "brand").is_none());
    }

    #[test]
    fn test_declared_lines_fall_back_to_first_line() {
        let mut doc = Document::new();
        doc.lines.themes.insert("dark".to_string(), 4);
        assert_eq!(doc.reference_line(DefinitionKind::Theme, "dark"), 4);
        assert_eq!(doc.reference_line(DefinitionKind::Preset, "dark"), 1);
        assert_eq!(doc.use_line("core"), 1);
        assert_eq!(doc.version_line(), 1);
    }
}
