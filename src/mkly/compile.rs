//! The compile orchestrator
//!
//!     Ties parsing, the StyleGraph engine and the kits together:
//!
//!         source ─parse─> Document ─┬─ resolve kits (core + `use`), version gate
//!                                   ├─ kit then plugin document transforms
//!                                   ├─ style sections ─> merged StyleGraph
//!                                   ├─ themes, presets ─> variable cascade
//!                                   ├─ depth-first render ─> HTML + source map
//!                                   ├─ after-compile hooks
//!                                   └─ layered CSS + metadata ─> output wrapper
//!
//!     Variables cascade from lowest to highest precedence: kit defaults, theme variables,
//!     preset variables, style-section variables, caller overrides.
//!
//!     Compiling never fails. Problems are diagnostics on the result, and rendering continues
//!     past them. The fatal ones (oversized source, too many blocks, unsupported version)
//!     produce a result with empty HTML and CSS.
//!
//!     Submodules:
//!         - [context](context): per-compile state handed to renderers
//!         - [resolve](resolve): kits, themes and presets from directive names
//!         - [render](render): block dispatch, validation, source map
//!         - [assemble](assemble): layered CSS, metadata and the output wrapper

pub mod assemble;
pub mod context;
pub mod render;
pub mod resolve;

pub use assemble::{OutputParts, RoundTripMeta};
pub use context::CompileContext;
pub use render::SourceMapEntry;

use crate::mkly::ast::{error_count, has_fatal, Diagnostic, Document, DEFAULT_VERSION};
use crate::mkly::config::MklyConfig;
use crate::mkly::kit::builtin::CORE_KIT;
use crate::mkly::kit::{Kit, KitRegistry, Plugin, Preset, Theme};
use crate::mkly::parsing::{parse_document, ParseOptions};
use crate::mkly::style::variables::{VariableMap, VariableMode};
use crate::mkly::style::{parse_style, StyleGraph};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Default ceiling on block nesting during rendering.
pub const DEFAULT_MAX_DEPTH: usize = 24;

/// Everything a compile call needs besides the document.
#[derive(Clone)]
pub struct CompileOptions {
    pub kits: KitRegistry,
    pub plugins: Vec<Arc<dyn Plugin>>,
    /// Themes available by name in addition to the kits' own
    pub themes: Vec<Theme>,
    pub presets: Vec<Preset>,
    /// Caller overrides, the top of the variable cascade
    pub variables: VariableMap,
    pub variable_mode: VariableMode,
    pub source_map: bool,
    /// Wrap the output in the document fragment; otherwise `html` holds the blocks only
    pub wrap: bool,
    pub max_depth: usize,
    /// Used by [`compile_source`]
    pub parse: ParseOptions,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from a loaded configuration.
    pub fn from_config(config: &MklyConfig) -> Self {
        Self {
            variable_mode: config.output.variable_mode,
            source_map: config.output.source_map,
            wrap: config.output.wrap,
            max_depth: config.limits.max_depth,
            parse: ParseOptions {
                max_source_bytes: config.limits.max_source_bytes,
                max_blocks: config.limits.max_blocks,
                max_nesting: config.limits.max_nesting,
                ..ParseOptions::default()
            },
            ..Self::default()
        }
    }

    pub fn with_kit(mut self, kit: Kit) -> Self {
        self.kits.register(kit);
        self
    }

    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.themes.push(theme);
        self
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.presets.push(preset);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            kits: KitRegistry::with_defaults(),
            plugins: Vec::new(),
            themes: Vec::new(),
            presets: Vec::new(),
            variables: VariableMap::new(),
            variable_mode: VariableMode::default(),
            source_map: false,
            wrap: true,
            max_depth: DEFAULT_MAX_DEPTH,
            parse: ParseOptions::default(),
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("kits", &self.kits.list_kits())
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("variable_mode", &self.variable_mode)
            .field("source_map", &self.source_map)
            .field("wrap", &self.wrap)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileResult {
    pub html: String,
    pub css: String,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<Vec<SourceMapEntry>>,
    pub style_graph: StyleGraph,
    pub meta: RoundTripMeta,
}

impl CompileResult {
    /// A result carrying only diagnostics, for fatal conditions.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn is_fatal(&self) -> bool {
        has_fatal(&self.diagnostics)
    }

    pub fn error_count(&self) -> usize {
        error_count(&self.diagnostics)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Parse and compile source text.
///
/// Verbatim block types from every registered kit are honored while parsing.
pub fn compile_source(source: &str, options: &CompileOptions) -> CompileResult {
    let mut parse = options.parse.clone();
    parse.verbatim_types.extend(options.kits.verbatim_types());
    let doc = parse_document(source, &parse);
    compile(&doc, options)
}

/// Version the document compiles as, or the fatal diagnostic rejecting it.
fn effective_version(doc: &Document, core: Option<&Kit>) -> Result<u32, Diagnostic> {
    let (current, supported) = match core {
        Some(kit) => (kit.current_version, kit.supported_versions.clone()),
        None => (DEFAULT_VERSION, BTreeSet::from([DEFAULT_VERSION])),
    };
    let version = doc.version.unwrap_or(current);
    if supported.contains(&version) {
        return Ok(version);
    }
    let listed: Vec<String> = supported.iter().map(u32::to_string).collect();
    Err(Diagnostic::fatal(
        doc.version_line(),
        format!(
            "Unsupported version {} (supported: {})",
            version,
            listed.join(", ")
        ),
    )
    .with_code("unsupported-version"))
}

/// Compile a parsed document.
pub fn compile(doc: &Document, options: &CompileOptions) -> CompileResult {
    let mut diagnostics = doc.diagnostics.clone();
    if has_fatal(&diagnostics) {
        return CompileResult::failed(diagnostics);
    }

    let kits = resolve::resolve_kits(doc, &options.kits, &mut diagnostics);
    let version = match effective_version(doc, options.kits.get(CORE_KIT)) {
        Ok(version) => version,
        Err(fatal) => {
            diagnostics.push(fatal);
            return CompileResult::failed(diagnostics);
        }
    };
    log::debug!(
        "compiling version {} with kits [{}]",
        version,
        kits.iter().map(|k| k.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let transforms = kits.iter().any(|kit| kit.has_transform()) || !options.plugins.is_empty();
    let doc = if transforms {
        let mut owned = doc.clone();
        for kit in &kits {
            owned = kit.apply_transform(owned);
        }
        for plugin in &options.plugins {
            owned = plugin.transform(owned);
        }
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(doc)
    };

    let mut graph = StyleGraph::new();
    for section in &doc.styles {
        let parsed = parse_style(&section.text);
        for warning in &parsed.warnings {
            diagnostics.push(
                Diagnostic::warning(section.line + warning.line - 1, warning.message.clone())
                    .with_code("style"),
            );
        }
        graph = graph.merge(&parsed);
    }

    let themes = resolve::resolve_themes(&doc, &kits, &options.themes, &mut diagnostics);
    let presets = resolve::resolve_presets(&doc, &kits, &options.presets, &mut diagnostics);
    let styled_themes = assemble::styled_themes(&themes);
    let styled_presets = assemble::styled_presets(&presets);

    let mut variables = VariableMap::new();
    for kit in &kits {
        variables.extend(kit.variables.clone());
    }
    for theme in &styled_themes {
        variables.extend(theme.source.variables.clone());
        variables.extend(theme.graph.variables.iter().cloned());
    }
    for preset in &styled_presets {
        variables.extend(preset.source.theme.variables.clone());
        variables.extend(preset.graph.variables.iter().cloned());
    }
    variables.extend(graph.variables.iter().cloned());
    variables.extend(options.variables.clone());

    let mut ctx = CompileContext::new(version);
    ctx.variables = variables;
    ctx.variable_mode = options.variable_mode;
    ctx.style_graph = graph;
    ctx.diagnostics = diagnostics;

    let renderer = render::Renderer::new(&kits, &options.plugins, options.max_depth);
    let rendered = renderer.render_all(&doc.blocks, &mut ctx);

    let mut body = rendered.html.clone();
    for kit in &kits {
        body = kit.apply_after_compile(body, &mut ctx);
    }
    for plugin in &options.plugins {
        body = plugin.after_compile(body, &mut ctx);
    }
    let mut entries = if body == rendered.html {
        Some(rendered.entries)
    } else {
        log::debug!("after-compile hooks changed the markup; source map dropped");
        None
    };

    let css = assemble::build_css(&kits, &styled_themes, &styled_presets, &ctx);
    let meta = RoundTripMeta {
        version,
        kits: kits.iter().map(|k| k.name.clone()).collect(),
        themes: themes.iter().map(|t| t.name.clone()).collect(),
        presets: presets.iter().map(|p| p.name().to_string()).collect(),
        styles: doc.styles.iter().map(|s| s.text.clone()).collect(),
        definitions: doc.definitions.clone(),
        meta: doc.meta.clone(),
    };

    let html = if options.wrap {
        let parts = OutputParts {
            html: &body,
            css: &css,
            meta: &meta,
        };
        let (html, offset) = match options
            .plugins
            .iter()
            .find_map(|plugin| plugin.wrap_output(&parts))
        {
            Some(html) => {
                let offset = html.find(body.as_str());
                (html, offset)
            }
            None => {
                let (html, offset) = assemble::default_wrapper(&parts);
                (html, Some(offset))
            }
        };
        entries = match (offset, entries) {
            (Some(offset), Some(mut list)) => {
                for entry in &mut list {
                    entry.offset += offset;
                }
                Some(list)
            }
            _ => None,
        };
        html
    } else {
        body
    };

    log::debug!(
        "compiled {} bytes of html, {} bytes of css, {} diagnostics",
        html.len(),
        css.len(),
        ctx.diagnostics.len()
    );

    CompileResult {
        html,
        css,
        diagnostics: ctx.diagnostics,
        source_map: if options.source_map { entries } else { None },
        style_graph: ctx.style_graph,
        meta,
    }
}
