//! Block rendering
//!
//!     Rendering is a sequential depth-first walk. For each block:
//!         1. Dispatch: a plugin override if one claims the type, else the kit definition,
//!            else the unknown-block fallback, which still shows the author's content.
//!         2. Validation against the definition: version gate, required properties, content
//!            mode, container flag. Problems become diagnostics; rendering goes on.
//!         3. Children are rendered one level deeper and substituted for the container's
//!            [`CHILD_PLACEHOLDER`]. Past the depth ceiling a block renders as a comment.
//!
//!     Each rendered block also yields a source-map entry. Offsets are relative to the
//!     block's own markup and are shifted as the markup is spliced into its parent, so the
//!     final offsets index into the assembled HTML.

use super::context::CompileContext;
use crate::mkly::ast::{Block, Diagnostic};
use crate::mkly::kit::{
    escape_html, BlockDefinition, BlockRenderer, ContentMode, Kit, Plugin, CHILD_PLACEHOLDER,
};
use serde::Serialize;
use std::sync::Arc;

/// Markup emitted in place of blocks nested past the depth ceiling.
pub const DEPTH_PLACEHOLDER: &str = "<!-- mkly: nesting limit reached -->";

/// Where one block's markup sits in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMapEntry {
    pub block_type: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Byte offset into the HTML
    pub offset: usize,
    /// Byte length of the block's markup, children included
    pub length: usize,
}

/// Markup plus the source-map entries inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub entries: Vec<SourceMapEntry>,
}

impl Rendered {
    /// Append markup, shifting its entries by the current length.
    pub fn append(&mut self, other: Rendered) {
        let shift = self.html.len();
        self.html.push_str(&other.html);
        self.entries.extend(other.entries.into_iter().map(|mut entry| {
            entry.offset += shift;
            entry
        }));
    }

    /// Shift every entry by a fixed amount.
    pub fn shift(&mut self, by: usize) {
        for entry in &mut self.entries {
            entry.offset += by;
        }
    }
}

/// Find the definition for a block type among the active kits.
///
/// Qualified types look in the named kit only; bare types take the first active kit (core
/// comes first) that defines them.
pub fn find_block<'a>(
    kits: &[&'a Kit],
    block_type: &str,
) -> Option<(&'a Kit, &'a BlockDefinition)> {
    match block_type.split_once('/') {
        Some((kit_name, name)) => kits
            .iter()
            .copied()
            .find(|kit| kit.name == kit_name)
            .and_then(|kit| kit.block(name).map(|def| (kit, def))),
        None => kits
            .iter()
            .copied()
            .find_map(|kit| kit.block(block_type).map(|def| (kit, def))),
    }
}

pub struct Renderer<'a> {
    kits: &'a [&'a Kit],
    plugins: &'a [Arc<dyn Plugin>],
    max_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(kits: &'a [&'a Kit], plugins: &'a [Arc<dyn Plugin>], max_depth: usize) -> Self {
        Self {
            kits,
            plugins,
            max_depth,
        }
    }

    /// Render sibling blocks, separated by newlines.
    pub fn render_all(&self, blocks: &[Block], ctx: &mut CompileContext) -> Rendered {
        self.render_siblings(blocks, ctx, 1)
    }

    fn render_siblings(&self, blocks: &[Block], ctx: &mut CompileContext, depth: usize) -> Rendered {
        let mut out = Rendered::default();
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 {
                out.html.push('\n');
            }
            let rendered = self.render_block(block, ctx, depth);
            out.append(rendered);
        }
        out
    }

    fn plugin_renderer(&self, block: &Block, qualified: Option<&str>) -> Option<Arc<dyn BlockRenderer>> {
        self.plugins.iter().find_map(|plugin| {
            plugin
                .renderer(&block.block_type)
                .or_else(|| qualified.and_then(|name| plugin.renderer(name)))
        })
    }

    pub fn render_block(&self, block: &Block, ctx: &mut CompileContext, depth: usize) -> Rendered {
        if depth > self.max_depth {
            ctx.push(
                Diagnostic::warning(
                    block.range.start,
                    format!(
                        "Block nested deeper than {} levels is not rendered",
                        self.max_depth
                    ),
                )
                .with_block(block.block_type.clone())
                .with_code("max-depth"),
            );
            return Rendered {
                html: DEPTH_PLACEHOLDER.to_string(),
                entries: Vec::new(),
            };
        }

        let found = find_block(self.kits, &block.block_type);
        let qualified = found.map(|(kit, def)| format!("{}/{}", kit.name, def.name));

        let markup = match found {
            Some((_, definition)) if !version_allows(definition, ctx.version) => {
                ctx.push(
                    Diagnostic::warning(
                        block.range.start,
                        format!(
                            "Block '{}' requires version {} but the document is version {}",
                            block.block_type,
                            definition.min_version.unwrap_or_default(),
                            ctx.version
                        ),
                    )
                    .with_block(block.block_type.clone())
                    .with_code("version-gated"),
                );
                unknown_block(block)
            }
            Some((_, definition)) => {
                validate(block, definition, ctx);
                ctx.add_css(&definition.css);
                match self.plugin_renderer(block, qualified.as_deref()) {
                    Some(renderer) => renderer.render(block, ctx),
                    None => definition.renderer.render(block, ctx),
                }
            }
            None => match self.plugin_renderer(block, None) {
                Some(renderer) => renderer.render(block, ctx),
                None => {
                    ctx.push(
                        Diagnostic::warning(
                            block.range.start,
                            format!("Unknown block type '{}'", block.block_type),
                        )
                        .with_block(block.block_type.clone())
                        .with_code("unknown-block"),
                    );
                    unknown_block(block)
                }
            },
        };

        let children = self.render_siblings(&block.children, ctx, depth + 1);
        let mut rendered = splice_children(markup, children);
        rendered.entries.insert(
            0,
            SourceMapEntry {
                block_type: block.block_type.clone(),
                start_line: block.range.start,
                end_line: block.range.end,
                offset: 0,
                length: rendered.html.len(),
            },
        );
        rendered
    }
}

fn version_allows(definition: &BlockDefinition, version: u32) -> bool {
    definition.min_version.map_or(true, |min| version >= min)
}

/// Put rendered children where the placeholder is, or after the markup when there is none.
fn splice_children(markup: String, mut children: Rendered) -> Rendered {
    match markup.find(CHILD_PLACEHOLDER) {
        Some(pos) => {
            let mut html = String::with_capacity(markup.len() + children.html.len());
            html.push_str(&markup[..pos]);
            html.push_str(&children.html);
            html.push_str(&markup[pos + CHILD_PLACEHOLDER.len()..]);
            children.shift(pos);
            Rendered {
                html,
                entries: children.entries,
            }
        }
        None if children.html.is_empty() => Rendered {
            html: markup,
            entries: Vec::new(),
        },
        None => {
            let mut rendered = Rendered {
                html: markup,
                entries: Vec::new(),
            };
            rendered.html.push('\n');
            rendered.append(children);
            rendered
        }
    }
}

/// Inert placeholder that still shows the author's content.
pub fn unknown_block(block: &Block) -> String {
    format!(
        "<div class=\"mk-unknown\" data-mk-type=\"{}\">{}</div>",
        escape_html(&block.block_type),
        escape_html(block.content.trim())
    )
}

/// Check a block against its definition, once, before rendering.
fn validate(block: &Block, definition: &BlockDefinition, ctx: &mut CompileContext) {
    for property in &definition.required {
        let present = block
            .property(property)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            ctx.push(
                Diagnostic::error(
                    block.range.start,
                    format!("Missing required property '{}'", property),
                )
                .with_block(block.block_type.clone())
                .with_property(property.clone())
                .with_code("missing-property"),
            );
        }
    }

    match definition.mode {
        ContentMode::Properties if block.has_content() => ctx.push(
            Diagnostic::warning(
                block.range.start,
                format!(
                    "Block '{}' takes properties only; its content is ignored",
                    block.block_type
                ),
            )
            .with_block(block.block_type.clone())
            .with_code("content-mode"),
        ),
        ContentMode::Text if !block.properties.is_empty() => ctx.push(
            Diagnostic::warning(
                block.range.start,
                format!(
                    "Block '{}' takes text only; its properties are ignored",
                    block.block_type
                ),
            )
            .with_block(block.block_type.clone())
            .with_code("content-mode"),
        ),
        _ => {}
    }

    if !definition.container && !block.children.is_empty() {
        ctx.warn(
            block,
            format!(
                "Block '{}' is not a container; its children are rendered after it",
                block.block_type
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkly::kit::builtin::core_kit;

    fn render(blocks: &[Block], max_depth: usize) -> (Rendered, CompileContext) {
        let kit = core_kit();
        let kits = [&kit];
        let plugins: Vec<Arc<dyn Plugin>> = Vec::new();
        let renderer = Renderer::new(&kits, &plugins, max_depth);
        let mut ctx = CompileContext::new(2);
        let rendered = renderer.render_all(blocks, &mut ctx);
        (rendered, ctx)
    }

    #[test]
    fn test_children_replace_placeholder() {
        let section = Block::new("core/section", 1).with_children(vec![
            Block::new("core/text", 2).with_content("a"),
            Block::new("core/divider", 3),
        ]);
        let (rendered, ctx) = render(&[section], 24);
        assert_eq!(
            rendered.html,
            "<section class=\"mk-section\"><div class=\"mk-text\"><p>a</p></div>\n<hr class=\"mk-divider\"></section>"
        );
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_source_map_offsets_index_the_output() {
        let blocks = vec![
            Block::new("core/divider", 1),
            Block::new("core/section", 2).with_children(vec![Block::new("core/text", 3).with_content("hi")]),
        ];
        let (rendered, _) = render(&blocks, 24);
        assert_eq!(rendered.entries.len(), 3);
        for entry in &rendered.entries {
            let slice = &rendered.html[entry.offset..entry.offset + entry.length];
            match entry.block_type.as_str() {
                "core/divider" => assert_eq!(slice, "<hr class=\"mk-divider\">"),
                "core/text" => assert_eq!(slice, "<div class=\"mk-text\"><p>hi</p></div>"),
                _ => assert!(slice.starts_with("<section") && slice.ends_with("</section>")),
            }
        }
    }

    #[test]
    fn test_unknown_block_keeps_content() {
        let block = Block::new("fancy/widget", 4).with_content("<hello>");
        let (rendered, ctx) = render(&[block], 24);
        assert_eq!(
            rendered.html,
            "<div class=\"mk-unknown\" data-mk-type=\"fancy/widget\">&lt;hello&gt;</div>"
        );
        assert_eq!(ctx.diagnostics[0].code.as_deref(), Some("unknown-block"));
        assert_eq!(ctx.diagnostics[0].line, 4);
    }

    #[test]
    fn test_depth_ceiling_degrades_to_placeholder() {
        let nested = Block::new("core/section", 1).with_children(vec![Block::new("core/section", 2)
            .with_children(vec![Block::new("core/text", 3).with_content("deep")])]);
        let (rendered, ctx) = render(&[nested], 2);
        assert!(rendered.html.contains(DEPTH_PLACEHOLDER));
        assert!(!rendered.html.contains("deep"));
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].code.as_deref(), Some("max-depth"));
    }

    #[test]
    fn test_validation_reports_schema_problems() {
        let blocks = vec![
            Block::new("core/image", 1),
            Block::new("core/divider", 2).with_content("ignored"),
        ];
        let (_, ctx) = render(&blocks, 24);
        let codes: Vec<_> = ctx.diagnostics.iter().filter_map(|d| d.code.as_deref()).collect();
        assert_eq!(codes, vec!["missing-property", "content-mode"]);
        assert!(ctx.diagnostics[0].is_error());
        assert!(!ctx.diagnostics[0].fatal);
        assert_eq!(ctx.diagnostics[0].property.as_deref(), Some("src"));
    }

    #[test]
    fn test_version_gate() {
        let kit = core_kit();
        let kits = [&kit];
        let plugins: Vec<Arc<dyn Plugin>> = Vec::new();
        let renderer = Renderer::new(&kits, &plugins, 24);
        let mut ctx = CompileContext::new(1);
        let rendered = renderer.render_all(&[Block::new("card", 1).with_content("x")], &mut ctx);
        assert!(rendered.html.starts_with("<div class=\"mk-unknown\""));
        assert_eq!(ctx.diagnostics[0].code.as_deref(), Some("version-gated"));
    }

    #[test]
    fn test_bare_types_resolve_to_core() {
        let kit = core_kit();
        let kits = [&kit];
        let (found_kit, def) = find_block(&kits, "text").expect("text");
        assert_eq!(found_kit.name, "core");
        assert_eq!(def.name, "text");
        assert!(find_block(&kits, "news/text").is_none());
    }
}
