//! Canonical serialization
//!
//!     Writes a graph back out in the indentation dialect. The output is canonical rather than
//!     a copy of the source: variables come first, then one group per (block type, label) in
//!     order of first appearance, with the block's own properties before its sub-targets.
//!     Raw selector rules are each their own group, escaped with a leading `\` when the
//!     plain selector would read back as a block type or a variable.
//!
//!         accent: #e11d48
//!
//!         core/card
//!           padding: 16px
//!           :hover
//!             color: $accent
//!
//!         .promo
//!           color: red
//!
//!     Parsing the output yields the same rule keys, property mappings and variables, and
//!     serializing that again yields the same text.

use super::graph::{StyleGraph, StyleRule};
use super::parser::raw_selector_line;

const INDENT: &str = "  ";

/// Serialize a graph to canonical style text.
pub fn serialize(graph: &StyleGraph) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !graph.variables.is_empty() {
        let lines: Vec<String> = graph
            .variables
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect();
        sections.push(lines.join("\n"));
    }

    for group in group_rules(&graph.rules) {
        sections.push(serialize_group(&group));
    }

    if sections.is_empty() {
        return String::new();
    }
    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

/// Rules sharing one selector header.
fn group_rules(rules: &[StyleRule]) -> Vec<Vec<&StyleRule>> {
    let mut groups: Vec<Vec<&StyleRule>> = Vec::new();
    for rule in rules {
        let existing = if rule.key.is_raw() {
            None
        } else {
            groups.iter().position(|group| {
                let first = &group[0].key;
                !first.is_raw()
                    && first.block_type == rule.key.block_type
                    && first.label == rule.key.label
            })
        };
        match existing {
            Some(index) => groups[index].push(rule),
            None => groups.push(vec![rule]),
        }
    }
    groups
}

fn serialize_group(group: &[&StyleRule]) -> String {
    let first = &group[0].key;
    let mut lines = Vec::new();

    if first.is_raw() {
        lines.push(raw_selector_line(&first.target.to_string()));
        push_properties(&mut lines, group[0], 1);
        return lines.join("\n");
    }

    lines.push(match &first.label {
        Some(label) => format!("{}:{}", first.block_type, label),
        None => first.block_type.clone(),
    });
    if let Some(base) = group.iter().find(|r| r.key.target.is_base()) {
        push_properties(&mut lines, base, 1);
    }
    for rule in group.iter().filter(|r| !r.key.target.is_base()) {
        lines.push(format!("{}{}", INDENT, rule.key.target));
        push_properties(&mut lines, rule, 2);
    }
    lines.join("\n")
}

fn push_properties(lines: &mut Vec<String>, rule: &StyleRule, depth: usize) {
    let indent = INDENT.repeat(depth);
    for (name, value) in &rule.properties {
        lines.push(format!("{}{}: {}", indent, name, value));
    }
}
