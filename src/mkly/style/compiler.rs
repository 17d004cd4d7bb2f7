//! CSS generation
//!
//!     Turns graph rules into CSS and arranges CSS from every source into four cascade layers.
//!
//! Selectors
//!
//!     A block type maps to a base class: `.mk-card` for core or bare types, `.mk-news-hero`
//!     for `news/hero`. The rest of the key refines it:
//!
//!         label featured         .mk-card--featured
//!         :hover                 .mk-card:hover
//!         .img                   .mk-card__img
//!         .img:hover             .mk-card__img:hover
//!         >p                     .mk-card p
//!         raw selector           as written
//!
//! Propagation
//!
//!     Theme rules often style text tags directly (`.mk-card p`), which would beat a color set
//!     on a sub-element wrapper. A sub-element rule carrying typographic properties therefore
//!     also emits those properties on the text tags below it.
//!
//! Layers
//!
//!     Output is wrapped in `@layer kit, theme, preset, user;` so rules from the document's
//!     style sections always win over theme and kit rules, whatever their specificity.

use super::graph::{RuleKey, StyleGraph, StyleRule, Target};
use super::variables::{substitute, VariableMap, VariableMode};

/// Text tags that receive typographic properties from sub-element rules.
const TEXT_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "td",
    "th",
    "blockquote",
    "span",
];

/// Properties that inherit into text.
const TYPOGRAPHIC_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "line-height",
    "letter-spacing",
    "text-align",
    "text-transform",
    "text-decoration",
];

/// Kit namespace whose blocks get unprefixed class names.
const CORE_KIT: &str = "core";

/// Class name (without the dot) for a block type.
pub fn base_class(block_type: &str) -> String {
    match block_type.split_once('/') {
        Some((kit, name)) if kit != CORE_KIT => format!("mk-{}-{}", kit, name),
        Some((_, name)) => format!("mk-{}", name),
        None => format!("mk-{}", block_type),
    }
}

/// Concrete CSS selector for a rule key.
pub fn selector(key: &RuleKey) -> String {
    if let Target::Selector(raw) = &key.target {
        return raw.clone();
    }
    let mut base = format!(".{}", base_class(&key.block_type));
    if let Some(label) = &key.label {
        base.push_str("--");
        base.push_str(label);
    }
    match &key.target {
        Target::Base => base,
        Target::Pseudo(pseudo) => format!("{}{}", base, pseudo),
        Target::Element { name, pseudo } => {
            format!("{}__{}{}", base, name, pseudo.as_deref().unwrap_or(""))
        }
        Target::Descendant(inner) => format!("{} {}", base, inner),
        Target::Selector(raw) => raw.clone(),
    }
}

/// Options for turning rules into CSS.
#[derive(Debug, Clone, Copy)]
pub struct CssOptions<'a> {
    pub variable_mode: VariableMode,
    pub variables: &'a VariableMap,
}

/// One CSS rule block.
pub fn format_rule(selector: &str, declarations: &[(String, String)]) -> String {
    let mut out = format!("{} {{\n", selector);
    for (property, value) in declarations {
        out.push_str(&format!("  {}: {};\n", property, value));
    }
    out.push('}');
    out
}

fn compile_rule(rule: &StyleRule, options: &CssOptions) -> Vec<String> {
    let declarations: Vec<(String, String)> = rule
        .properties
        .iter()
        .map(|(property, value)| {
            (
                property.clone(),
                substitute(value, options.variable_mode, options.variables),
            )
        })
        .collect();
    let sel = selector(&rule.key);
    let mut out = vec![format_rule(&sel, &declarations)];

    if matches!(rule.key.target, Target::Element { .. }) {
        let typographic: Vec<(String, String)> = declarations
            .iter()
            .filter(|(property, _)| TYPOGRAPHIC_PROPERTIES.contains(&property.as_str()))
            .cloned()
            .collect();
        if !typographic.is_empty() {
            let tags: Vec<String> = TEXT_TAGS
                .iter()
                .map(|tag| format!("{} {}", sel, tag))
                .collect();
            out.push(format_rule(&tags.join(", "), &typographic));
        }
    }
    out
}

/// Compile every rule of a graph, in graph order.
pub fn compile_graph(graph: &StyleGraph, options: &CssOptions) -> String {
    graph
        .rules
        .iter()
        .flat_map(|rule| compile_rule(rule, options))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The four cascade layers, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Kit,
    Theme,
    Preset,
    User,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Kit, Layer::Theme, Layer::Preset, Layer::User];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Kit => "kit",
            Layer::Theme => "theme",
            Layer::Preset => "preset",
            Layer::User => "user",
        }
    }
}

/// CSS collected per layer, plus unlayered rules placed after the layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredCss {
    layers: [Vec<String>; 4],
    unlayered: Vec<String>,
}

impl LayeredCss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk of CSS to a layer; blank chunks are ignored.
    pub fn push(&mut self, layer: Layer, css: impl Into<String>) {
        let css = css.into();
        if !css.trim().is_empty() {
            self.layers[layer as usize].push(css.trim().to_string());
        }
    }

    pub fn push_unlayered(&mut self, css: impl Into<String>) {
        let css = css.into();
        if !css.trim().is_empty() {
            self.unlayered.push(css.trim().to_string());
        }
    }

    pub fn layer(&self, layer: Layer) -> &[String] {
        &self.layers[layer as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty) && self.unlayered.is_empty()
    }

    /// The layer order statement followed by each non-empty layer.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let order: Vec<&str> = Layer::ALL.iter().map(Layer::name).collect();
        let mut out = format!("@layer {};\n", order.join(", "));
        for layer in Layer::ALL {
            let chunks = self.layer(layer);
            if chunks.is_empty() {
                continue;
            }
            out.push_str(&format!("@layer {} {{\n", layer.name()));
            out.push_str(&chunks.join("\n"));
            out.push_str("\n}\n");
        }
        for chunk in &self.unlayered {
            out.push_str(chunk);
            out.push('\n');
        }
        out
    }
}
