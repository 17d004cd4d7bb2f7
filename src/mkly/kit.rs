//! Kits, themes, presets and plugins
//!
//!     The compiler does not know how to render any block by itself. Block types come from
//!     kits: a kit is a namespace of block definitions (content mode, container flag, optional
//!     minimum version, required properties, CSS and a render function) together with the
//!     themes and presets it ships, its default variables and its base CSS.
//!
//!     Plugins sit above kits: they can override the renderer of any block type, transform the
//!     document before rendering, post-process the rendered markup and replace the output
//!     wrapper.
//!
//!     Kits are looked up by name in a [`KitRegistry`]. The built-in `core` kit (see
//!     [builtin](builtin)) is always active and is what bare block types resolve against first.
//!
//! Rendering contract
//!
//!     A renderer receives the block and the per-compile [`CompileContext`] and returns
//!     markup. Container renderers place [`CHILD_PLACEHOLDER`] where the rendered children go.
//!     Renderers escape author text with [`escape_html`]; nothing else is sanitized.

pub mod builtin;

use crate::mkly::ast::{Block, Document};
use crate::mkly::compile::{CompileContext, OutputParts};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Marker a container renderer emits where its children belong.
pub const CHILD_PLACEHOLDER: &str = "<!--mk:children-->";

/// What a block accepts between its properties and its close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Properties only; content is ignored
    Properties,
    /// Text only; properties are ignored
    Text,
    /// Properties and text
    Mixed,
    /// Raw text captured up to the exact close marker
    Verbatim,
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentMode::Properties => "properties",
            ContentMode::Text => "text",
            ContentMode::Mixed => "mixed",
            ContentMode::Verbatim => "verbatim",
        };
        write!(f, "{}", name)
    }
}

/// Renders one block to markup.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, block: &Block, ctx: &mut CompileContext) -> String;
}

impl<F> BlockRenderer for F
where
    F: Fn(&Block, &mut CompileContext) -> String + Send + Sync,
{
    fn render(&self, block: &Block, ctx: &mut CompileContext) -> String {
        self(block, ctx)
    }
}

pub type DocumentTransform = Arc<dyn Fn(Document) -> Document + Send + Sync>;
pub type AfterCompileHook = Arc<dyn Fn(String, &mut CompileContext) -> String + Send + Sync>;

/// Schema and renderer for one block type.
#[derive(Clone)]
pub struct BlockDefinition {
    pub name: String,
    pub mode: ContentMode,
    pub container: bool,
    pub min_version: Option<u32>,
    pub required: Vec<String>,
    /// CSS added to the kit layer once per compile when the block is used
    pub css: String,
    pub renderer: Arc<dyn BlockRenderer>,
}

impl BlockDefinition {
    pub fn new<R>(name: impl Into<String>, mode: ContentMode, renderer: R) -> Self
    where
        R: BlockRenderer + 'static,
    {
        Self {
            name: name.into(),
            mode,
            container: false,
            min_version: None,
            required: Vec::new(),
            css: String::new(),
            renderer: Arc::new(renderer),
        }
    }

    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    pub fn min_version(mut self, version: u32) -> Self {
        self.min_version = Some(version);
        self
    }

    pub fn require(mut self, property: impl Into<String>) -> Self {
        self.required.push(property.into());
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }
}

impl fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("container", &self.container)
            .field("min_version", &self.min_version)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// Named variable defaults plus style text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Style sub-language text, either dialect
    #[serde(default)]
    pub style: String,
    /// Raw CSS, `$name` references allowed
    #[serde(default)]
    pub css: String,
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }
}

/// A theme that may also ship keyframe animations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(flatten)]
    pub theme: Theme,
    /// Keyframes name -> body
    #[serde(default)]
    pub keyframes: BTreeMap<String, String>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            theme: Theme::new(name),
            keyframes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.theme.name
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.theme = self.theme.with_variable(name, value);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.theme = self.theme.with_style(style);
        self
    }

    pub fn with_keyframes(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.keyframes.insert(name.into(), body.into());
        self
    }
}

/// Themes and presets supplied from a file rather than a kit.
///
///     themes:
///       - name: brand
///         variables: { accent: "#e11d48" }
///         style: |
///           core/heading
///             color: $accent
///     presets:
///       - name: airy
///         variables: { spacing: 24px }
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Suppliers {
    pub themes: Vec<Theme>,
    pub presets: Vec<Preset>,
}

impl Suppliers {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// A namespace of block definitions, themes and presets.
#[derive(Clone)]
pub struct Kit {
    pub name: String,
    pub current_version: u32,
    pub supported_versions: BTreeSet<u32>,
    pub blocks: BTreeMap<String, BlockDefinition>,
    pub themes: BTreeMap<String, Theme>,
    pub presets: BTreeMap<String, Preset>,
    /// Base CSS for the kit layer, `$name` references allowed
    pub css: String,
    pub variables: BTreeMap<String, String>,
    transform: Option<DocumentTransform>,
    after_compile: Option<AfterCompileHook>,
}

impl Kit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_version: 1,
            supported_versions: BTreeSet::from([1]),
            blocks: BTreeMap::new(),
            themes: BTreeMap::new(),
            presets: BTreeMap::new(),
            css: String::new(),
            variables: BTreeMap::new(),
            transform: None,
            after_compile: None,
        }
    }

    pub fn with_versions(mut self, current: u32, supported: impl IntoIterator<Item = u32>) -> Self {
        self.current_version = current;
        self.supported_versions = supported.into_iter().collect();
        self.supported_versions.insert(current);
        self
    }

    pub fn with_block(mut self, block: BlockDefinition) -> Self {
        self.blocks.insert(block.name.clone(), block);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.themes.insert(theme.name.clone(), theme);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.insert(preset.name().to_string(), preset);
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Document) -> Document + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_after_compile<F>(mut self, hook: F) -> Self
    where
        F: Fn(String, &mut CompileContext) -> String + Send + Sync + 'static,
    {
        self.after_compile = Some(Arc::new(hook));
        self
    }

    pub fn supports_version(&self, version: u32) -> bool {
        self.supported_versions.contains(&version)
    }

    /// Look up a block by its unqualified name.
    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }

    /// Look up a theme by bare or kit-qualified name.
    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.themes.get(self.local_name(name)?)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(self.local_name(name)?)
    }

    /// `core/default` -> `default` for this kit, `None` for another kit's namespace.
    fn local_name<'a>(&self, name: &'a str) -> Option<&'a str> {
        match name.split_once('/') {
            Some((kit, local)) if kit == self.name => Some(local),
            Some(_) => None,
            None => Some(name),
        }
    }

    /// Qualified names of the kit's verbatim block types.
    ///
    /// The core kit also contributes the bare names, since bare types resolve to core first.
    pub fn verbatim_types(&self) -> BTreeSet<String> {
        let mut types = BTreeSet::new();
        for block in self.blocks.values() {
            if block.mode == ContentMode::Verbatim {
                types.insert(format!("{}/{}", self.name, block.name));
                if self.name == builtin::CORE_KIT {
                    types.insert(block.name.clone());
                }
            }
        }
        types
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn apply_transform(&self, doc: Document) -> Document {
        match &self.transform {
            Some(transform) => transform(doc),
            None => doc,
        }
    }

    pub fn apply_after_compile(&self, html: String, ctx: &mut CompileContext) -> String {
        match &self.after_compile {
            Some(hook) => hook(html, ctx),
            None => html,
        }
    }
}

impl fmt::Debug for Kit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kit")
            .field("name", &self.name)
            .field("current_version", &self.current_version)
            .field("supported_versions", &self.supported_versions)
            .field("blocks", &self.blocks.keys().collect::<Vec<_>>())
            .field("themes", &self.themes.keys().collect::<Vec<_>>())
            .field("presets", &self.presets.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Optional hooks around compilation. Every method has a no-op default.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Renderer used instead of the kit's for this block type.
    fn renderer(&self, _block_type: &str) -> Option<Arc<dyn BlockRenderer>> {
        None
    }

    fn transform(&self, doc: Document) -> Document {
        doc
    }

    fn after_compile(&self, html: String, _ctx: &mut CompileContext) -> String {
        html
    }

    /// Replace the default output wrapper. The first plugin returning `Some` wins.
    fn wrap_output(&self, _parts: &OutputParts) -> Option<String> {
        None
    }
}

/// Registry of available kits
///
/// Kits are registered and retrieved by name. [`KitRegistry::with_defaults`] contains the
/// built-in core kit.
#[derive(Debug, Clone)]
pub struct KitRegistry {
    kits: HashMap<String, Kit>,
}

impl KitRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        KitRegistry {
            kits: HashMap::new(),
        }
    }

    /// Register a kit
    ///
    /// If a kit with the same name already exists, it will be replaced.
    pub fn register(&mut self, kit: Kit) {
        self.kits.insert(kit.name.clone(), kit);
    }

    pub fn get(&self, name: &str) -> Option<&Kit> {
        self.kits.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.kits.contains_key(name)
    }

    /// List all registered kit names (sorted)
    pub fn list_kits(&self) -> Vec<String> {
        let mut names: Vec<_> = self.kits.keys().cloned().collect();
        names.sort();
        names
    }

    /// Verbatim block types across every registered kit.
    pub fn verbatim_types(&self) -> BTreeSet<String> {
        self.kits.values().flat_map(Kit::verbatim_types).collect()
    }

    /// Create a registry with the built-in kits
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(builtin::core_kit());
        registry
    }
}

impl Default for KitRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
