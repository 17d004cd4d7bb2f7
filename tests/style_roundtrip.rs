//! Property-based tests for the StyleGraph engine
//!
//! Any graph serializes to text that parses back to the same variables, rule keys and
//! property mappings, and serializing is stable from then on.

use mkly::mkly::style::{RuleKey, StyleGraph, Target};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn block_types() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["core/text", "core/card", "core/button", "news/hero"])
        .prop_map(str::to_string)
}

fn targets() -> impl Strategy<Value = Target> {
    prop_oneof![
        Just(Target::Base),
        Just(Target::pseudo(":hover")),
        Just(Target::pseudo("::before")),
        Just(Target::element("img")),
        Just(Target::Element {
            name: "link".to_string(),
            pseudo: Some(":hover".to_string()),
        }),
        Just(Target::descendant("p")),
    ]
}

fn block_keys() -> impl Strategy<Value = RuleKey> {
    (
        block_types(),
        targets(),
        prop::option::of(prop::sample::select(vec!["featured", "wide", "alt"])),
    )
        .prop_map(|(block_type, target, label)| {
            let key = RuleKey::new(block_type).with_target(target);
            match label {
                Some(label) => key.with_label(label),
                None => key,
            }
        })
}

/// Raw selectors, including bare words and tags that look like block types.
fn raw_selectors() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\.[a-z][a-z0-9-]{0,7}(:hover)?",
        "[a-z]{1,8}",
        "[a-z]{2,5}/[a-z]{2,5}",
        prop::sample::select(vec!["p", "hr", "img", "a:hover"]).prop_map(str::to_string),
    ]
}

fn rule_keys() -> impl Strategy<Value = RuleKey> {
    prop_oneof![
        3 => block_keys(),
        2 => raw_selectors().prop_map(RuleKey::raw),
    ]
}

/// Values, some with trailing comments and some with nothing but a comment.
fn values() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z0-9]{1,8}",
        1 => "[a-z0-9]{1,8} // [a-z]{1,5}",
        1 => "// [a-z]{1,5}",
    ]
}

fn properties() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{2,8}(-[a-z]{2,5})?", values(), 1..4)
}

/// Indentation-dialect text built from the line forms authors write.
fn style_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z]{1,6}: ([a-z0-9]{1,6}|// [a-z]{1,4})",
            "(core/card|core/text:wide|hr|p|\\.promo|\\\\hr)",
            "  (:hover|\\.img|>p)( // [a-z]{1,4})?",
            "    [a-z]{2,6}: [a-z0-9]{1,6}( // [a-z]{1,4})?",
        ],
        0..12,
    )
    .prop_map(|lines| lines.join("\n"))
}

fn graphs() -> impl Strategy<Value = StyleGraph> {
    (
        prop::collection::btree_map("[a-z][a-z0-9]{0,6}", values(), 0..4),
        prop::collection::vec((rule_keys(), properties()), 0..6),
    )
        .prop_map(|(variables, rules)| {
            let mut graph = StyleGraph::new();
            for (name, value) in &variables {
                graph = graph.set_variable(name, value);
            }
            for (key, props) in &rules {
                for (property, value) in props {
                    graph = graph.set_property(key, property, value);
                }
            }
            graph
        })
}

fn variable_set(graph: &StyleGraph) -> BTreeSet<(String, String)> {
    graph.variables.iter().cloned().collect()
}

fn rule_map(graph: &StyleGraph) -> BTreeMap<RuleKey, BTreeMap<String, String>> {
    graph
        .rules
        .iter()
        .map(|rule| {
            (
                rule.key.clone(),
                rule.properties.iter().cloned().collect::<BTreeMap<_, _>>(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn serialized_graphs_parse_back(graph in graphs()) {
        let text = graph.serialize();
        let parsed = StyleGraph::parse(&text);

        prop_assert!(parsed.warnings.is_empty(), "warnings {:?} for\n{}", parsed.warnings, text);
        prop_assert_eq!(variable_set(&parsed), variable_set(&graph));
        prop_assert_eq!(rule_map(&parsed), rule_map(&graph));
    }

    #[test]
    fn serialization_is_idempotent(graph in graphs()) {
        let once = graph.serialize();
        let twice = StyleGraph::parse(&once).serialize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn parsed_text_survives_serialization(text in style_text()) {
        let graph = StyleGraph::parse(&text);
        let reparsed = StyleGraph::parse(&graph.serialize());

        prop_assert!(reparsed.warnings.is_empty(), "warnings {:?} for\n{}", reparsed.warnings, text);
        prop_assert_eq!(variable_set(&reparsed), variable_set(&graph));
        prop_assert_eq!(rule_map(&reparsed), rule_map(&graph));
    }

    #[test]
    fn parsing_arbitrary_text_never_panics(text in "[ -~\n]{0,200}") {
        let graph = StyleGraph::parse(&text);
        let _ = graph.serialize();
    }
}

#[test]
fn test_raw_selector_compiles_verbatim() {
    let graph = StyleGraph::parse(".my-class\n  color: red");
    assert_eq!(graph.rules.len(), 1);
    assert_eq!(graph.rules[0].key, RuleKey::raw(".my-class"));
    assert_eq!(graph.rules[0].key.target, Target::selector(".my-class"));

    let variables = Default::default();
    let css = mkly::mkly::style::compile_graph(
        &graph,
        &mkly::mkly::style::CssOptions {
            variable_mode: Default::default(),
            variables: &variables,
        },
    );
    assert!(css.contains(".my-class {"));
    assert!(css.contains("color: red;"));
}

#[test]
fn test_both_dialects_build_the_same_graph() {
    let indented = StyleGraph::parse("accent: red\ncore/card\n  padding: 8px\n  :hover\n    color: $accent");
    let braces = StyleGraph::parse(
        "$accent: red;\ncore/card {\n  padding: 8px;\n  &:hover {\n    color: $accent;\n  }\n}",
    );
    assert_eq!(variable_set(&indented), variable_set(&braces));
    assert_eq!(rule_map(&indented), rule_map(&braces));
}
