//! Style text parsing
//!
//!     Style text comes in two dialects that produce the same [`StyleGraph`] shape. The
//!     dialect is detected per section: any brace outside strings, comments and escapes selects
//!     the brace dialect (see [legacy](legacy)), otherwise the text is read as the indentation
//!     dialect implemented here.
//!
//! Indentation dialect
//!
//!     Lines at column 0 are one of:
//!         - a variable, `accent: #e11d48` or `$accent: #e11d48` (the colon must be followed by
//!           whitespace, which keeps `a:hover` a selector)
//!         - a block selector, `card`, `core/card` or `core/card:featured` (labels only on
//!           kit-qualified types)
//!         - anything else is a raw CSS selector, passed through verbatim
//!
//!     A leading backslash forces a raw selector: `\hr` is the CSS selector `hr`, where a bare
//!     `hr` would name a block type. The serializer writes raw selectors that way whenever the
//!     plain form would read back as something else.
//!
//!     The first indented line under a selector fixes the base indent of that selector.
//!     Indented lines are either a sub-target (`.name`, `:pseudo`, `::pseudo`, `>tag`,
//!     `>.class`, each optionally followed by pseudos) which switches the current target, or a
//!     `property: value` declaration for the current target. A declaration at or left of the
//!     base indent belongs to the selector itself again:
//!
//!         core/card
//!           padding: 16px
//!           .img
//!             border-radius: 8px
//!           margin: 0            <- back on core/card itself
//!
//!     Sub-targets always attach to the selector, not to a previous sub-target. Under a raw
//!     selector they are appended to the selector text (`.promo` + `:hover` gives
//!     `.promo:hover`, `.promo` + `.title` gives `.promo .title`).
//!
//!     Nothing here is an error. Recoverable oddities (an HTML tag used as a top-level
//!     selector, a Sass function in a value, a line that fits no form) are reported as
//!     [`StyleWarning`]s on the graph.

pub mod legacy;

use super::graph::{RuleKey, StyleGraph, StyleWarning, Target};
use super::lexer::{function_names, has_unescaped_brace, strip_comments};
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix that makes a top-level line a raw selector.
pub const RAW_ESCAPE: char = '\\';

/// Sass helpers that authors sometimes carry over; they are not evaluated.
const SASS_FUNCTIONS: &[&str] = &[
    "darken",
    "lighten",
    "mix",
    "saturate",
    "desaturate",
    "adjust-hue",
    "fade-in",
    "fade-out",
    "transparentize",
    "opacify",
    "tint",
    "shade",
    "percentage",
];

/// Tag names that are not mkly block types; used as top-level selectors they are most likely
/// a mistake for a `>tag` sub-target.
const HTML_TAGS: &[&str] = &[
    "a",
    "p",
    "div",
    "span",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "img",
    "table",
    "tr",
    "td",
    "th",
    "blockquote",
    "body",
    "article",
    "header",
    "footer",
    "nav",
    "main",
    "strong",
    "em",
    "pre",
    "figure",
];

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$?([A-Za-z_][\w-]*):\s+(.+)$").expect("variable pattern is valid")
});

static BLOCK_SELECTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*/[A-Za-z][\w-]*)(?::([A-Za-z0-9_-]+))?$|^([A-Za-z][\w-]*)$")
        .expect("block selector pattern is valid")
});

static SUB_TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\.([A-Za-z_][\w-]*)|>\s*(\.?[A-Za-z_][\w-]*))?((?:::?[A-Za-z-]+(?:\([^)]*\))?)*)$")
        .expect("sub-target pattern is valid")
});

static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-{0,2}[A-Za-z_][\w-]*)\s*:\s*(.*?);?$").expect("declaration pattern is valid")
});

/// What a selector line opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Block {
        block_type: String,
        label: Option<String>,
    },
    Raw(String),
}

impl Header {
    /// Rule key for this header with the given target.
    pub fn key(&self, target: Target) -> RuleKey {
        match self {
            Header::Block { block_type, label } => RuleKey {
                block_type: block_type.clone(),
                target,
                label: label.clone(),
            },
            Header::Raw(selector) => match target {
                Target::Selector(combined) => RuleKey::raw(combined),
                _ => RuleKey::raw(selector.clone()),
            },
        }
    }

    /// The target a declaration lands on when no sub-target is active.
    pub fn base_target(&self) -> Target {
        match self {
            Header::Block { .. } => Target::Base,
            Header::Raw(selector) => Target::Selector(selector.clone()),
        }
    }

    /// Resolve a sub-target against this header.
    pub fn sub_target(&self, sub: &SubTarget) -> Target {
        match self {
            Header::Block { .. } => sub.target(),
            Header::Raw(selector) => Target::Selector(sub.append_to(selector)),
        }
    }

    /// Resolve a sub-target nested inside `outer`, a target already resolved against this
    /// header. Block targets only take a further pseudo; `None` when the combination has no
    /// target form.
    pub fn nested_target(&self, outer: &Target, sub: &SubTarget) -> Option<Target> {
        if let Target::Selector(selector) = outer {
            return Some(Target::Selector(sub.append_to(selector)));
        }
        if matches!(self, Header::Raw(_)) {
            return Some(self.sub_target(sub));
        }
        match (outer, sub) {
            (Target::Base, _) => Some(sub.target()),
            (Target::Pseudo(first), SubTarget::Pseudo(pseudo)) => {
                Some(Target::Pseudo(format!("{}{}", first, pseudo)))
            }
            (Target::Element { name, pseudo: first }, SubTarget::Pseudo(pseudo)) => {
                Some(Target::Element {
                    name: name.clone(),
                    pseudo: Some(format!("{}{}", first.as_deref().unwrap_or(""), pseudo)),
                })
            }
            (Target::Descendant(selector), SubTarget::Pseudo(pseudo)) => {
                Some(Target::Descendant(format!("{}{}", selector, pseudo)))
            }
            _ => None,
        }
    }
}

/// A parsed sub-target line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubTarget {
    Pseudo(String),
    Element { name: String, pseudo: String },
    Descendant(String),
}

impl SubTarget {
    fn target(&self) -> Target {
        match self {
            SubTarget::Pseudo(pseudo) => Target::Pseudo(pseudo.clone()),
            SubTarget::Element { name, pseudo } => Target::Element {
                name: name.clone(),
                pseudo: (!pseudo.is_empty()).then(|| pseudo.clone()),
            },
            SubTarget::Descendant(selector) => Target::Descendant(selector.clone()),
        }
    }

    fn append_to(&self, selector: &str) -> String {
        match self {
            SubTarget::Pseudo(pseudo) => format!("{}{}", selector, pseudo),
            SubTarget::Element { name, pseudo } => format!("{} .{}{}", selector, name, pseudo),
            SubTarget::Descendant(inner) => format!("{} > {}", selector, inner),
        }
    }
}

/// Parse one style section, detecting its dialect.
pub fn parse_style(text: &str) -> StyleGraph {
    if has_unescaped_brace(text) {
        log::trace!("style section uses the brace dialect");
        legacy::parse_braces(text)
    } else {
        parse_indented(text)
    }
}

/// Classify a top-level selector line.
pub fn parse_header(text: &str, line: usize, warnings: &mut Vec<StyleWarning>) -> Header {
    if let Some(escaped) = text.strip_prefix(RAW_ESCAPE) {
        return Header::Raw(escaped.to_string());
    }
    if let Some(caps) = BLOCK_SELECTOR_RE.captures(text) {
        if let Some(qualified) = caps.get(1) {
            return Header::Block {
                block_type: qualified.as_str().to_string(),
                label: caps.get(2).map(|m| m.as_str().to_string()),
            };
        }
        if let Some(bare) = caps.get(3) {
            let name = bare.as_str();
            if HTML_TAGS.contains(&name) {
                warnings.push(StyleWarning::new(
                    line,
                    format!(
                        "'{}' is an HTML tag, not a block type; it is used as a raw CSS selector",
                        name
                    ),
                ));
                return Header::Raw(name.to_string());
            }
            return Header::Block {
                block_type: name.to_string(),
                label: None,
            };
        }
    }
    Header::Raw(text.to_string())
}

/// Header line for a raw selector that parses back to the same selector.
pub fn raw_selector_line(selector: &str) -> String {
    let mut warnings = Vec::new();
    let reads_back = !VARIABLE_RE.is_match(selector)
        && parse_header(selector, 0, &mut warnings) == Header::Raw(selector.to_string())
        && warnings.is_empty();
    if reads_back {
        selector.to_string()
    } else {
        format!("{}{}", RAW_ESCAPE, selector)
    }
}

/// Parse a sub-target line such as `.img:hover` or `>p`.
pub fn parse_sub_target(text: &str) -> Option<SubTarget> {
    let caps = SUB_TARGET_RE.captures(text)?;
    let pseudo = caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string();
    if let Some(name) = caps.get(1) {
        return Some(SubTarget::Element {
            name: name.as_str().to_string(),
            pseudo,
        });
    }
    if let Some(inner) = caps.get(2) {
        return Some(SubTarget::Descendant(format!("{}{}", inner.as_str(), pseudo)));
    }
    if pseudo.is_empty() {
        None
    } else {
        Some(SubTarget::Pseudo(pseudo))
    }
}

/// Split a `property: value` line, with comments stripped from the value.
pub fn parse_declaration(text: &str) -> Option<(String, String)> {
    let caps = DECLARATION_RE.captures(text)?;
    let value = clean_value(&caps[2]);
    if value.is_empty() {
        return None;
    }
    Some((caps[1].to_string(), value))
}

/// Strip trailing comments and a trailing semicolon from a value.
pub fn clean_value(raw: &str) -> String {
    let value = strip_comments(raw);
    value.trim().trim_end_matches(';').trim_end().to_string()
}

/// Warn about Sass functions in a value; they are passed through unevaluated.
pub fn check_value(value: &str, line: usize, warnings: &mut Vec<StyleWarning>) {
    for name in function_names(value) {
        if SASS_FUNCTIONS.contains(&name) {
            warnings.push(StyleWarning::new(
                line,
                format!(
                    "Sass function '{}()' is not supported; the value is passed through as written",
                    name
                ),
            ));
        }
    }
}

/// Whole-line comment in the indentation dialect.
fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || (trimmed.starts_with("/*") && strip_comments(trimmed).is_empty())
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 2 } else { 1 })
        .sum()
}

/// Collects declarations for the current target and turns them into rules.
struct Builder {
    graph: StyleGraph,
    header: Option<Header>,
    base_indent: Option<usize>,
    target: Target,
    pending: Vec<(String, String)>,
}

impl Builder {
    fn new() -> Self {
        Self {
            graph: StyleGraph::new(),
            header: None,
            base_indent: None,
            target: Target::Base,
            pending: Vec::new(),
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let properties = std::mem::take(&mut self.pending);
        if let Some(header) = &self.header {
            self.graph.absorb(header.key(self.target.clone()), &properties);
        }
    }

    fn open(&mut self, header: Option<Header>) {
        self.flush();
        self.target = header
            .as_ref()
            .map(Header::base_target)
            .unwrap_or(Target::Base);
        self.header = header;
        self.base_indent = None;
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.graph.warnings.push(StyleWarning::new(line, message));
    }

    fn top_level(&mut self, trimmed: &str, line: usize) {
        if let Some(caps) = VARIABLE_RE.captures(trimmed) {
            self.open(None);
            let value = clean_value(&caps[2]);
            if value.is_empty() {
                self.warn(line, format!("Variable '{}' has no value", &caps[1]));
                return;
            }
            check_value(&value, line, &mut self.graph.warnings);
            self.graph.put_variable(&caps[1], &value);
            return;
        }
        let selector = strip_comments(trimmed);
        let header = parse_header(&selector, line, &mut self.graph.warnings);
        self.open(Some(header));
    }

    fn indented(&mut self, trimmed: &str, indent: usize, line: usize) {
        let Some(header) = self.header.clone() else {
            self.warn(line, format!("Indented line outside a selector: '{}'", trimmed));
            return;
        };
        let base = *self.base_indent.get_or_insert(indent);

        let stripped = strip_comments(trimmed);
        let text = stripped.trim();
        if let Some(sub) = parse_sub_target(text) {
            self.flush();
            self.target = header.sub_target(&sub);
            return;
        }
        match parse_declaration(text) {
            Some((property, value)) => {
                let base_target = header.base_target();
                if indent <= base && self.target != base_target {
                    self.flush();
                    self.target = base_target;
                }
                check_value(&value, line, &mut self.graph.warnings);
                self.pending.push((property, value));
            }
            None => self.warn(line, format!("Unrecognized style line: '{}'", trimmed)),
        }
    }

    fn finish(mut self) -> StyleGraph {
        self.flush();
        self.graph
    }
}

/// Parse the indentation dialect.
pub fn parse_indented(text: &str) -> StyleGraph {
    let mut builder = Builder::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }
        match indent_width(raw) {
            0 => builder.top_level(trimmed, line),
            indent => builder.indented(trimmed, indent, line),
        }
    }
    builder.finish()
}
