//! Directive and block parser
//!
//!     A finite-state machine over line tokens. The active [`Accumulator`] determines the state:
//!     idle, an ordinary block in properties, content or verbatim state, or a special directive
//!     collecting its lines. Every open directive flushes the current accumulator first.
//!
//! Nesting
//!
//!     Flushed blocks land in a flat buffer. Every ordinary block pushes an open frame that
//!     remembers its position in that buffer. A close directive pops frames down to the
//!     innermost open frame of the same type; frames above it belong to leaves that were never
//!     closed. Everything flushed after the matched block becomes its children. Inner
//!     containers are collapsed before the outer close arrives.
//!
//!     Each flushed block carries the height of its subtree. A close that would build a tree
//!     taller than [`ParseOptions::max_nesting`] is refused: one warning is reported and the
//!     blocks after the container stay its siblings, so later passes over the tree only ever
//!     see bounded depth.
//!
//!     A close with no open frame of that type is a warning and changes nothing.

use super::accumulator::{trim_blank_lines, trim_blank_tokens, Accumulator, BlockState};
use super::directive::{Directive, Phase};
use super::ParseOptions;
use crate::mkly::ast::{Block, Comment, DefinitionKind, Diagnostic, Document, InlineDefinition, StyleSection};
use crate::mkly::token::{LineToken, LineType};

/// Prefix reserved for styling; block properties may not use it.
pub const RESERVED_STYLE_PREFIX: &str = "@";

#[derive(Debug, Clone)]
struct OpenFrame {
    name: String,
    index: usize,
}

pub(super) struct Parser<'a> {
    options: &'a ParseOptions,
    doc: Document,
    buffer: Vec<Block>,
    /// Subtree height of each buffered block
    heights: Vec<usize>,
    open: Vec<OpenFrame>,
    phase: Phase,
    blocks_opened: usize,
    truncated: bool,
    nesting_capped: bool,
}

impl<'a> Parser<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        Self {
            options,
            doc: Document::new(),
            buffer: Vec::new(),
            heights: Vec::new(),
            open: Vec::new(),
            phase: Phase::Use,
            blocks_opened: 0,
            truncated: false,
            nesting_capped: false,
        }
    }

    /// Run the state machine over all tokens.
    pub fn run(mut self, tokens: Vec<LineToken>) -> Document {
        let mut acc = Accumulator::Idle;
        for token in tokens {
            acc = self.step(acc, token);
            if self.truncated {
                break;
            }
        }
        self.finish(acc)
    }

    fn step(&mut self, acc: Accumulator, token: LineToken) -> Accumulator {
        if let Accumulator::Block {
            block,
            state: BlockState::Verbatim,
            lines,
        } = acc
        {
            return self.step_verbatim(block, lines, token);
        }
        match token.line_type.clone() {
            LineType::BlockOpen { name, label } => {
                self.flush(acc);
                self.open_directive(name, label, token.line)
            }
            LineType::BlockClose { name } => self.close_directive(acc, &name, token.line),
            _ => match acc {
                Accumulator::Idle => self.step_idle(token),
                Accumulator::Block { block, state, lines } => {
                    self.step_block(block, state, lines, token)
                }
                Accumulator::Special {
                    directive,
                    label,
                    line,
                    lines,
                } => self.step_special(directive, label, line, lines, token),
            },
        }
    }

    fn step_idle(&mut self, token: LineToken) -> Accumulator {
        match token.line_type {
            LineType::Blank => {}
            LineType::Comment { text } => self.record_comment(token.line, text),
            _ => self.doc.diagnostics.push(
                Diagnostic::warning(token.line, "Content outside of a block is ignored")
                    .with_code("orphan-content"),
            ),
        }
        Accumulator::Idle
    }

    fn step_block(
        &mut self,
        mut block: Block,
        mut state: BlockState,
        mut lines: Vec<String>,
        token: LineToken,
    ) -> Accumulator {
        if let LineType::Comment { text } = &token.line_type {
            // a verbatim body may open with a comment line
            let starts_verbatim =
                state == BlockState::Properties && self.options.is_verbatim(&block.block_type);
            if !starts_verbatim {
                self.record_comment(token.line, text.clone());
                return Accumulator::Block { block, state, lines };
            }
        }
        block.range.extend_to(token.line);
        match (state, token.line_type) {
            (BlockState::Properties, LineType::Property { key, value }) => {
                self.set_property(&mut block, key, value, token.line);
            }
            (BlockState::Properties, line_type) => {
                state = self.body_state(&block);
                log::trace!("line {}: {} enters {:?} state", token.line, block.block_type, state);
                if line_type != LineType::Blank {
                    lines.push(token.raw);
                }
            }
            (_, LineType::Blank) => lines.push(String::new()),
            (_, _) => lines.push(token.raw),
        }
        Accumulator::Block { block, state, lines }
    }

    fn step_verbatim(
        &mut self,
        mut block: Block,
        mut lines: Vec<String>,
        token: LineToken,
    ) -> Accumulator {
        let state = BlockState::Verbatim;
        if let LineType::BlockClose { name } = &token.line_type {
            if *name == block.block_type {
                let name = name.clone();
                return self.close_directive(
                    Accumulator::Block { block, state, lines },
                    &name,
                    token.line,
                );
            }
        }
        block.range.extend_to(token.line);
        lines.push(token.raw);
        Accumulator::Block { block, state, lines }
    }

    fn step_special(
        &mut self,
        directive: Directive,
        label: Option<String>,
        line: usize,
        mut lines: Vec<LineToken>,
        token: LineToken,
    ) -> Accumulator {
        let keeps_comments = matches!(
            directive,
            Directive::Style | Directive::DefineTheme | Directive::DefinePreset
        );
        let comment = match &token.line_type {
            LineType::Comment { text } if !keeps_comments => Some(text.clone()),
            _ => None,
        };
        match comment {
            Some(text) => self.record_comment(token.line, text),
            None => lines.push(token),
        }
        Accumulator::Special {
            directive,
            label,
            line,
            lines,
        }
    }

    fn open_directive(&mut self, name: String, label: Option<String>, line: usize) -> Accumulator {
        let directive = Directive::from_name(&name);
        self.check_phase(directive, &name, line);

        if directive.is_special() {
            log::trace!("line {}: special directive '{}'", line, name);
            return Accumulator::special(directive, label, line);
        }

        if self.blocks_opened >= self.options.max_blocks {
            self.doc.diagnostics.push(
                Diagnostic::fatal(
                    line,
                    format!(
                        "Document exceeds the maximum of {} blocks; parsing stopped",
                        self.options.max_blocks
                    ),
                )
                .with_code("too-many-blocks"),
            );
            self.truncated = true;
            return Accumulator::Idle;
        }
        self.blocks_opened += 1;

        let mut block = Block::new(name.clone(), line);
        block.label = label;
        self.open.push(OpenFrame {
            name,
            index: self.buffer.len(),
        });
        log::trace!("line {}: open {}", line, block.block_type);
        Accumulator::Block {
            block,
            state: BlockState::Properties,
            lines: Vec::new(),
        }
    }

    fn close_directive(&mut self, acc: Accumulator, name: &str, line: usize) -> Accumulator {
        let directive = Directive::from_name(name);
        if directive.is_special() {
            let closes_active = matches!(
                &acc,
                Accumulator::Special { directive: open, .. } if *open == directive
            );
            if closes_active {
                self.flush(acc);
                return Accumulator::Idle;
            }
            self.unmatched_close(name, line);
            return acc;
        }

        self.flush(acc);
        let Some(position) = self.open.iter().rposition(|frame| frame.name == name) else {
            self.unmatched_close(name, line);
            return Accumulator::Idle;
        };
        let frame = self.open[position].clone();
        self.open.truncate(position);

        let height = 1 + self
            .heights
            .get(frame.index + 1..)
            .and_then(|inner| inner.iter().copied().max())
            .unwrap_or(0);
        if height > self.options.max_nesting {
            self.nesting_exceeded(name, line);
            return Accumulator::Idle;
        }

        let children = self.buffer.split_off(frame.index + 1);
        self.heights.truncate(frame.index + 1);
        if let Some(slot) = self.heights.get_mut(frame.index) {
            *slot = height;
        }
        if let Some(container) = self.buffer.get_mut(frame.index) {
            log::trace!(
                "line {}: close {} with {} children",
                line,
                name,
                children.len()
            );
            container.children = children;
            container.range.extend_to(line);
        }
        Accumulator::Idle
    }

    /// State after the properties of a block: content, or verbatim for kit-declared types.
    fn body_state(&self, block: &Block) -> BlockState {
        if self.options.is_verbatim(&block.block_type) {
            BlockState::Verbatim
        } else {
            BlockState::Content
        }
    }

    fn unmatched_close(&mut self, name: &str, line: usize) {
        self.doc.diagnostics.push(
            Diagnostic::warning(
                line,
                format!("Close directive '--- /{}' has no matching open block", name),
            )
            .with_block(name)
            .with_code("unmatched-close"),
        );
    }

    fn nesting_exceeded(&mut self, name: &str, line: usize) {
        if self.nesting_capped {
            log::debug!("line {}: close of {} left unnested", line, name);
            return;
        }
        self.nesting_capped = true;
        self.doc.diagnostics.push(
            Diagnostic::warning(
                line,
                format!(
                    "Blocks are nested deeper than {} levels; the blocks inside '{}' stay at its level",
                    self.options.max_nesting, name
                ),
            )
            .with_block(name)
            .with_code("nesting-too-deep"),
        );
    }

    fn check_phase(&mut self, directive: Directive, name: &str, line: usize) {
        let phase = directive.phase();
        if phase < self.phase {
            self.doc.diagnostics.push(
                Diagnostic::error(
                    line,
                    format!(
                        "Directive '{}' is out of order: the '{}' phase must come before '{}'",
                        name, phase, self.phase
                    ),
                )
                .with_code("directive-order"),
            );
        } else {
            self.phase = phase;
        }
    }

    fn set_property(&mut self, block: &mut Block, key: String, value: String, line: usize) {
        if key.starts_with(RESERVED_STYLE_PREFIX) {
            self.doc.diagnostics.push(
                Diagnostic::error(
                    line,
                    format!(
                        "Property '{}' uses the reserved styling prefix '{}'; move styling to a --- style section",
                        key, RESERVED_STYLE_PREFIX
                    ),
                )
                .with_block(block.block_type.clone())
                .with_property(key)
                .with_code("reserved-property"),
            );
            return;
        }
        if block.properties.contains_key(&key) {
            self.doc.diagnostics.push(
                Diagnostic::warning(
                    line,
                    format!("Duplicate property '{}'; the last value wins", key),
                )
                .with_block(block.block_type.clone())
                .with_property(key.clone())
                .with_code("duplicate-property"),
            );
        }
        block.properties.insert(key, value);
    }

    fn record_comment(&mut self, line: usize, text: String) {
        self.doc.comments.push(Comment { line, text });
    }

    fn flush(&mut self, acc: Accumulator) {
        match acc {
            Accumulator::Idle => {}
            Accumulator::Block {
                mut block,
                state,
                lines,
            } => {
                block.content = trim_blank_lines(&lines).join("\n");
                log::trace!("flush {} ({:?})", block.block_type, state);
                self.buffer.push(block);
                self.heights.push(1);
            }
            Accumulator::Special {
                directive,
                label,
                line,
                lines,
            } => self.flush_special(directive, label, line, lines),
        }
    }

    fn flush_special(
        &mut self,
        directive: Directive,
        label: Option<String>,
        line: usize,
        lines: Vec<LineToken>,
    ) {
        let lines = trim_blank_tokens(&lines);
        match directive {
            Directive::Meta => self.flush_meta(lines),
            Directive::Style => {
                if let Some(first) = lines.first() {
                    let text = lines
                        .iter()
                        .map(|t| t.raw.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    self.doc.styles.push(StyleSection {
                        text,
                        line: first.line,
                    });
                }
            }
            Directive::Use | Directive::Theme | Directive::Preset => {
                let names = collect_names(label.as_deref(), line, lines);
                if names.is_empty() {
                    self.doc.diagnostics.push(
                        Diagnostic::warning(
                            line,
                            format!(
                                "'{}' directive names nothing",
                                directive.keyword().unwrap_or_default()
                            ),
                        )
                        .with_code("empty-directive"),
                    );
                }
                let (target, declared_at) = match directive {
                    Directive::Use => (&mut self.doc.uses, &mut self.doc.lines.uses),
                    Directive::Theme => (&mut self.doc.themes, &mut self.doc.lines.themes),
                    _ => (&mut self.doc.presets, &mut self.doc.lines.presets),
                };
                for (name, at) in names {
                    if !target.contains(&name) {
                        declared_at.insert(name.clone(), at);
                        target.push(name);
                    }
                }
            }
            Directive::DefineTheme => self.flush_definition(DefinitionKind::Theme, label, line, lines),
            Directive::DefinePreset => {
                self.flush_definition(DefinitionKind::Preset, label, line, lines)
            }
            Directive::Block => {}
        }
    }

    fn flush_meta(&mut self, lines: &[LineToken]) {
        for token in lines {
            match &token.line_type {
                LineType::Property { key, value } if key == "version" => {
                    match value.trim().parse::<u32>() {
                        Ok(version) => {
                            self.doc.version = Some(version);
                            self.doc.lines.version = Some(token.line);
                        }
                        Err(_) => self.doc.diagnostics.push(
                            Diagnostic::warning(
                                token.line,
                                format!(
                                    "Invalid version '{}'; using the default version",
                                    value
                                ),
                            )
                            .with_property("version")
                            .with_code("invalid-version"),
                        ),
                    }
                }
                LineType::Property { key, value } => {
                    if self
                        .doc
                        .meta
                        .insert(key.clone(), value.clone())
                        .is_some()
                    {
                        self.doc.diagnostics.push(
                            Diagnostic::warning(
                                token.line,
                                format!("Duplicate meta key '{}'; the last value wins", key),
                            )
                            .with_property(key.clone())
                            .with_code("duplicate-property"),
                        );
                    }
                }
                LineType::Blank => {}
                _ => self.doc.diagnostics.push(
                    Diagnostic::warning(
                        token.line,
                        "Meta sections only accept 'key: value' lines",
                    )
                    .with_code("invalid-meta"),
                ),
            }
        }
    }

    fn flush_definition(
        &mut self,
        kind: DefinitionKind,
        label: Option<String>,
        line: usize,
        lines: &[LineToken],
    ) {
        let name = label.unwrap_or_else(|| {
            self.doc.diagnostics.push(
                Diagnostic::warning(
                    line,
                    format!("'{}' requires a name, e.g. '--- {}: brand'", kind.directive(), kind.directive()),
                )
                .with_code("unnamed-definition"),
            );
            "unnamed".to_string()
        });

        let mut variables: Vec<(String, String)> = Vec::new();
        let split = lines
            .iter()
            .position(|t| !matches!(t.line_type, LineType::Property { .. }))
            .unwrap_or(lines.len());
        for token in &lines[..split] {
            if let LineType::Property { key, value } = &token.line_type {
                let key = key.trim_start_matches('$').to_string();
                match variables.iter_mut().find(|(k, _)| *k == key) {
                    Some(existing) => existing.1 = value.clone(),
                    None => variables.push((key, value.clone())),
                }
            }
        }
        let body = trim_blank_tokens(&lines[split..])
            .iter()
            .map(|t| t.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let definition = InlineDefinition {
            kind,
            name,
            variables,
            body,
            line,
        };
        if definition.is_empty() {
            self.doc.diagnostics.push(
                Diagnostic::warning(
                    line,
                    format!("Empty {} definition '{}'", kind, definition.name),
                )
                .with_code("empty-definition"),
            );
        }
        self.doc.definitions.push(definition);
    }

    fn finish(mut self, acc: Accumulator) -> Document {
        if let Accumulator::Block {
            block,
            state: BlockState::Verbatim,
            ..
        } = &acc
        {
            self.doc.diagnostics.push(
                Diagnostic::warning(
                    block.range.start,
                    format!(
                        "Verbatim block '{}' is not closed with '--- /{}'",
                        block.block_type, block.block_type
                    ),
                )
                .with_block(block.block_type.clone())
                .with_code("unclosed-verbatim"),
            );
        }
        self.flush(acc);
        self.doc.blocks = std::mem::take(&mut self.buffer);
        log::debug!(
            "parsed {} top-level blocks, {} diagnostics",
            self.doc.blocks.len(),
            self.doc.diagnostics.len()
        );
        self.doc
    }
}

/// Names from a directive label (comma separated) and its body lines, each with its line.
fn collect_names(label: Option<&str>, line: usize, lines: &[LineToken]) -> Vec<(String, usize)> {
    label
        .map(|label| (label, line))
        .into_iter()
        .chain(
            lines
                .iter()
                .filter(|t| !t.is_blank())
                .map(|t| (t.raw.as_str(), t.line)),
        )
        .flat_map(|(text, at)| text.split(',').map(move |name| (name.trim(), at)))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, at)| (name.to_string(), at))
        .collect()
}
