//! Output assembly
//!
//!     Builds the final CSS from every contributor and wraps the rendered blocks.
//!
//!     CSS goes into four layers:
//!         kit      kit base CSS, then block CSS in first-use order
//!         theme    each active theme: compiled style text, then raw CSS
//!         preset   each active preset: compiled style text, raw CSS, keyframes
//!         user     the document's own style sections
//!
//!     In custom-properties mode the cascaded variables follow the layers as one unlayered
//!     rule on `.mkly-document`.
//!
//!     The default wrapper is a fragment: a `<style>` element, the blocks inside
//!     `<div class="mkly-document">`, and a trailing `<!--mkly {...}-->` comment carrying the
//!     metadata a reverse conversion needs (version, active kits, themes and presets, the
//!     verbatim style text, inline definitions and meta).

use super::context::CompileContext;
use crate::mkly::ast::InlineDefinition;
use crate::mkly::kit::{Kit, Preset, Theme};
use crate::mkly::style::compiler::{compile_graph, format_rule, CssOptions, Layer, LayeredCss};
use crate::mkly::style::variables::{declarations, substitute, VariableMode};
use crate::mkly::style::{parse_style, StyleGraph};
use serde::Serialize;
use std::collections::BTreeMap;

/// Class of the element wrapping the rendered blocks.
pub const DOCUMENT_CLASS: &str = "mkly-document";

/// What a reverse conversion needs to rebuild an equivalent source document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundTripMeta {
    pub version: u32,
    pub kits: Vec<String>,
    pub themes: Vec<String>,
    pub presets: Vec<String>,
    /// Style sections exactly as written
    pub styles: Vec<String>,
    pub definitions: Vec<InlineDefinition>,
    pub meta: BTreeMap<String, String>,
}

/// Everything an output wrapper gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct OutputParts<'a> {
    pub html: &'a str,
    pub css: &'a str,
    pub meta: &'a RoundTripMeta,
}

/// Themes and presets with their style text parsed.
pub struct Styled<'a, T> {
    pub source: &'a T,
    pub graph: StyleGraph,
}

pub fn styled_themes(themes: &[Theme]) -> Vec<Styled<'_, Theme>> {
    themes
        .iter()
        .map(|theme| Styled {
            source: theme,
            graph: parse_style(&theme.style),
        })
        .collect()
}

pub fn styled_presets(presets: &[Preset]) -> Vec<Styled<'_, Preset>> {
    presets
        .iter()
        .map(|preset| Styled {
            source: preset,
            graph: parse_style(&preset.theme.style),
        })
        .collect()
}

fn theme_css(theme: &Theme, graph: &StyleGraph, options: &CssOptions) -> String {
    let mut parts = vec![compile_graph(graph, options)];
    parts.push(substitute(&theme.css, options.variable_mode, options.variables));
    parts.retain(|p| !p.trim().is_empty());
    parts.join("\n")
}

/// Assemble the layered CSS for a compile.
pub fn build_css(
    kits: &[&Kit],
    themes: &[Styled<'_, Theme>],
    presets: &[Styled<'_, Preset>],
    ctx: &CompileContext,
) -> String {
    let options = CssOptions {
        variable_mode: ctx.variable_mode,
        variables: &ctx.variables,
    };
    let mut css = LayeredCss::new();

    for kit in kits {
        css.push(Layer::Kit, ctx.css_value(&kit.css));
    }
    for block_css in ctx.block_css() {
        css.push(Layer::Kit, ctx.css_value(block_css));
    }

    for theme in themes {
        css.push(Layer::Theme, theme_css(theme.source, &theme.graph, &options));
    }

    for preset in presets {
        css.push(
            Layer::Preset,
            theme_css(&preset.source.theme, &preset.graph, &options),
        );
        for (name, body) in &preset.source.keyframes {
            css.push(
                Layer::Preset,
                format!("@keyframes {} {{\n{}\n}}", name, body.trim()),
            );
        }
    }

    css.push(Layer::User, compile_graph(&ctx.style_graph, &options));

    if ctx.variable_mode == VariableMode::CustomProperties && !ctx.variables.is_empty() {
        css.push_unlayered(format_rule(
            &format!(".{}", DOCUMENT_CLASS),
            &declarations(&ctx.variables),
        ));
    }

    css.render()
}

/// Metadata comment, with `--` escaped so the comment stays well-formed.
pub fn meta_comment(meta: &RoundTripMeta) -> String {
    let json = serde_json::to_string(meta).unwrap_or_else(|_| "{}".to_string());
    format!("<!--mkly {}-->", json.replace("--", "\\u002d\\u002d"))
}

/// The default fragment wrapper. Returns the markup and the byte offset of the blocks in it.
pub fn default_wrapper(parts: &OutputParts) -> (String, usize) {
    let mut out = String::new();
    if !parts.css.trim().is_empty() {
        out.push_str("<style>\n");
        out.push_str(parts.css.trim_end());
        out.push_str("\n</style>\n");
    }
    out.push_str(&format!("<div class=\"{}\">\n", DOCUMENT_CLASS));
    let offset = out.len();
    out.push_str(parts.html);
    out.push_str("\n</div>\n");
    out.push_str(&meta_comment(parts.meta));
    (out, offset)
}
