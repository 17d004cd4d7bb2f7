//! The built-in core kit
//!
//!     Every compile has the core kit active, so plain documents render without registering
//!     anything. Bare block types (`text`) resolve to core before any other kit.
//!
//!     Blocks:
//!         text      text       paragraphs, split on blank lines
//!         heading   mixed      `level` 1-6 (default 2)
//!         image     properties requires `src`; `alt`, `width`
//!         button    mixed      requires `url`; label from content or `label`
//!         divider   properties
//!         spacer    properties `height` (default 24px)
//!         quote     mixed      `author`
//!         code      verbatim   `lang`
//!         html      verbatim   passed through unescaped
//!         section   container
//!         card      container, mixed, version 2 and later; `image`
//!
//!     Versions: current 2, supported 1 and 2. The kit ships the `default` theme and the
//!     `rounded` preset.

use super::{escape_html, BlockDefinition, ContentMode, Kit, Preset, Theme, CHILD_PLACEHOLDER};
use crate::mkly::ast::Block;
use crate::mkly::compile::CompileContext;
use crate::mkly::style::compiler::base_class;

/// Name of the core kit.
pub const CORE_KIT: &str = "core";

const BASE_CSS: &str = ".mkly-document {
  font-family: $fontBody;
  color: $text;
  background: $bg;
  line-height: 1.5;
}";

/// Build the core kit.
pub fn core_kit() -> Kit {
    Kit::new(CORE_KIT)
        .with_versions(2, [1, 2])
        .with_css(BASE_CSS)
        .with_variable("accent", "#2563eb")
        .with_variable("accentHover", "#1d4ed8")
        .with_variable("bg", "#ffffff")
        .with_variable("text", "#111827")
        .with_variable("muted", "#6b7280")
        .with_variable("border", "#e5e7eb")
        .with_variable("radius", "4px")
        .with_variable("fontBody", "system-ui, sans-serif")
        .with_variable("fontHeading", "$fontBody")
        .with_variable("spacing", "16px")
        .with_block(
            BlockDefinition::new("text", ContentMode::Text, render_text)
                .with_css(".mk-text {\n  margin: 0 0 $spacing;\n}"),
        )
        .with_block(
            BlockDefinition::new("heading", ContentMode::Mixed, render_heading)
                .with_css(".mk-heading {\n  font-family: $fontHeading;\n  margin: 0 0 $spacing;\n}"),
        )
        .with_block(
            BlockDefinition::new("image", ContentMode::Properties, render_image)
                .require("src")
                .with_css(".mk-image {\n  display: block;\n  max-width: 100%;\n}"),
        )
        .with_block(
            BlockDefinition::new("button", ContentMode::Mixed, render_button)
                .require("url")
                .with_css(
                    ".mk-button {\n  display: inline-block;\n  padding: 10px 20px;\n  background: $accent;\n  color: #ffffff;\n  border-radius: $radius;\n  text-decoration: none;\n}\n.mk-button:hover {\n  background: $accentHover;\n}",
                ),
        )
        .with_block(
            BlockDefinition::new("divider", ContentMode::Properties, render_divider)
                .with_css(".mk-divider {\n  border: 0;\n  border-top: 1px solid $border;\n}"),
        )
        .with_block(BlockDefinition::new(
            "spacer",
            ContentMode::Properties,
            render_spacer,
        ))
        .with_block(
            BlockDefinition::new("quote", ContentMode::Mixed, render_quote)
                .with_css(".mk-quote {\n  margin: 0 0 $spacing;\n  padding-left: 12px;\n  border-left: 3px solid $accent;\n  color: $muted;\n}"),
        )
        .with_block(
            BlockDefinition::new("code", ContentMode::Verbatim, render_code)
                .with_css(".mk-code {\n  overflow-x: auto;\n  font-family: ui-monospace, monospace;\n}"),
        )
        .with_block(BlockDefinition::new(
            "html",
            ContentMode::Verbatim,
            render_html,
        ))
        .with_block(
            BlockDefinition::new("section", ContentMode::Properties, render_section).container(),
        )
        .with_block(
            BlockDefinition::new("card", ContentMode::Mixed, render_card)
                .container()
                .min_version(2)
                .with_css(".mk-card {\n  padding: $spacing;\n  border: 1px solid $border;\n  border-radius: $radius;\n}"),
        )
        .with_theme(
            Theme::new("default")
                .with_style("core/heading\n  color: $text\n  font-weight: 700\ncore/quote\n  >p\n    margin: 0"),
        )
        .with_preset(
            Preset::new("rounded")
                .with_variable("radius", "12px")
                .with_style("core/card\n  animation: mk-fade-in 0.3s ease-out\ncore/image\n  border-radius: $radius")
                .with_keyframes("mk-fade-in", "from { opacity: 0; }\nto { opacity: 1; }"),
        )
}

/// `class="mk-card mk-card--featured"` for a block.
pub fn class_attr(block: &Block) -> String {
    let base = base_class(&block.block_type);
    match &block.label {
        Some(label) => format!("{} {}--{}", base, base, escape_html(label)),
        None => base,
    }
}

/// Paragraphs separated by blank lines, line breaks kept.
fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim())).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_text(block: &Block, _ctx: &mut CompileContext) -> String {
    format!(
        "<div class=\"{}\">{}</div>",
        class_attr(block),
        paragraphs(&block.content)
    )
}

fn render_heading(block: &Block, ctx: &mut CompileContext) -> String {
    let level = match block.property("level") {
        None => 2,
        Some(raw) => match raw.trim().parse::<u8>() {
            Ok(level @ 1..=6) => level,
            _ => {
                ctx.warn(block, format!("Heading level '{}' is not 1-6; using 2", raw));
                2
            }
        },
    };
    let text = if block.has_content() {
        block.content.trim().to_string()
    } else {
        block.property("text").unwrap_or_default().to_string()
    };
    format!(
        "<h{level} class=\"{}\">{}</h{level}>",
        class_attr(block),
        escape_html(&text),
        level = level
    )
}

fn render_image(block: &Block, _ctx: &mut CompileContext) -> String {
    let mut out = format!(
        "<img class=\"{}\" src=\"{}\" alt=\"{}\"",
        class_attr(block),
        escape_html(block.property("src").unwrap_or_default()),
        escape_html(block.property("alt").unwrap_or_default())
    );
    if let Some(width) = block.property("width") {
        out.push_str(&format!(" width=\"{}\"", escape_html(width)));
    }
    out.push('>');
    out
}

fn render_button(block: &Block, _ctx: &mut CompileContext) -> String {
    let label = if block.has_content() {
        block.content.trim()
    } else {
        block.property("label").unwrap_or("Click here")
    };
    format!(
        "<a class=\"{}\" href=\"{}\">{}</a>",
        class_attr(block),
        escape_html(block.property("url").unwrap_or_default()),
        escape_html(label)
    )
}

fn render_divider(block: &Block, _ctx: &mut CompileContext) -> String {
    format!("<hr class=\"{}\">", class_attr(block))
}

fn render_spacer(block: &Block, _ctx: &mut CompileContext) -> String {
    format!(
        "<div class=\"{}\" style=\"height: {}\"></div>",
        class_attr(block),
        escape_html(block.property("height").unwrap_or("24px"))
    )
}

fn render_quote(block: &Block, _ctx: &mut CompileContext) -> String {
    let mut out = format!(
        "<blockquote class=\"{}\">{}",
        class_attr(block),
        paragraphs(&block.content)
    );
    if let Some(author) = block.property("author") {
        out.push_str(&format!("<cite>{}</cite>", escape_html(author)));
    }
    out.push_str("</blockquote>");
    out
}

fn render_code(block: &Block, _ctx: &mut CompileContext) -> String {
    let lang = block
        .property("lang")
        .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
        .unwrap_or_default();
    format!(
        "<pre class=\"{}\"><code{}>{}</code></pre>",
        class_attr(block),
        lang,
        escape_html(&block.content)
    )
}

fn render_html(block: &Block, _ctx: &mut CompileContext) -> String {
    format!("<div class=\"{}\">{}</div>", class_attr(block), block.content)
}

fn render_section(block: &Block, _ctx: &mut CompileContext) -> String {
    format!(
        "<section class=\"{}\">{}</section>",
        class_attr(block),
        CHILD_PLACEHOLDER
    )
}

fn render_card(block: &Block, _ctx: &mut CompileContext) -> String {
    let mut out = format!("<div class=\"{}\">", class_attr(block));
    if let Some(image) = block.property("image") {
        let base = base_class(&block.block_type);
        out.push_str(&format!(
            "<img class=\"{}__img\" src=\"{}\" alt=\"\">",
            base,
            escape_html(image)
        ));
    }
    if block.has_content() {
        out.push_str(&paragraphs(&block.content));
    }
    out.push_str(CHILD_PLACEHOLDER);
    out.push_str("</div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(block: &Block) -> (String, CompileContext) {
        let kit = core_kit();
        let mut ctx = CompileContext::new(kit.current_version);
        let definition = kit.block(block.short_type()).expect("core block");
        let html = definition.renderer.render(block, &mut ctx);
        (html, ctx)
    }

    #[test]
    fn test_core_kit_shape() {
        let kit = core_kit();
        assert_eq!(kit.current_version, 2);
        assert!(kit.supports_version(1));
        assert!(kit.block("card").map(|b| b.container).unwrap_or(false));
        assert_eq!(kit.block("card").and_then(|b| b.min_version), Some(2));
        assert!(kit.theme("default").is_some());
        assert!(kit.preset("core/rounded").is_some());

        let verbatim = kit.verbatim_types();
        for name in ["code", "core/code", "html", "core/html"] {
            assert!(verbatim.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_text_paragraphs_are_escaped() {
        let block = Block::new("core/text", 1).with_content("Hello <b>world</b>\nsecond line\n\nNext");
        let (html, _) = render(&block);
        assert_eq!(
            html,
            "<div class=\"mk-text\"><p>Hello &lt;b&gt;world&lt;/b&gt;<br>second line</p>\n<p>Next</p></div>"
        );
    }

    #[test]
    fn test_heading_level_fallback_warns() {
        let block = Block::new("core/heading", 3)
            .with_property("level", "9")
            .with_content("Title");
        let (html, ctx) = render(&block);
        assert_eq!(html, "<h2 class=\"mk-heading\">Title</h2>");
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].line, 3);
    }

    #[test]
    fn test_labelled_button() {
        let block = Block::new("core/button", 1)
            .with_label("primary")
            .with_property("url", "https://example.com/?a=1&b=2")
            .with_content("Read more");
        let (html, _) = render(&block);
        assert_eq!(
            html,
            "<a class=\"mk-button mk-button--primary\" href=\"https://example.com/?a=1&amp;b=2\">Read more</a>"
        );
    }

    #[test]
    fn test_card_has_child_placeholder() {
        let block = Block::new("core/card", 1).with_property("image", "a.png");
        let (html, _) = render(&block);
        assert!(html.contains(CHILD_PLACEHOLDER));
        assert!(html.contains("<img class=\"mk-card__img\" src=\"a.png\" alt=\"\">"));
    }

    #[test]
    fn test_html_block_is_not_escaped() {
        let block = Block::new("core/html", 1).with_content("<table><tr><td>x</td></tr></table>");
        let (html, _) = render(&block);
        assert_eq!(
            html,
            "<div class=\"mk-html\"><table><tr><td>x</td></tr></table></div>"
        );
    }
}
