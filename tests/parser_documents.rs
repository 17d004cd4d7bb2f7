//! Document-level parser tests
//!
//! Whole mkly sources run through the public parse entry point, checked with the fluent
//! assertions from `mkly::testing`.

use mkly::mkly::ast::{Document, Severity};
use mkly::mkly::testing::assert_doc;
use mkly::{parse_document, ParseOptions};
use rstest::rstest;

fn parse(source: &str) -> Document {
    parse_document(source, &ParseOptions::default())
}

fn ordering_errors(doc: &Document) -> Vec<&str> {
    doc.diagnostics
        .iter()
        .filter(|d| d.code.as_deref() == Some("directive-order"))
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn test_explicit_close_nests_child() {
    let doc = parse("--- A\n--- B\nx\n--- /B\n--- /A");
    assert_doc(&doc).block_count(1).block(0, |a| {
        a.block_type("A")
            .child_count(1)
            .child(0, |b| {
                b.block_type("B").content("x").child_count(0).lines(2, 4);
            })
            .lines(1, 5);
    });
    assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
}

#[test]
fn test_unmatched_close_changes_nothing() {
    let with_close = parse("--- core/text\nhello\n--- /C");
    let without = parse("--- core/text\nhello");
    assert_eq!(with_close.blocks.len(), without.blocks.len());
    assert_eq!(with_close.blocks[0].content, without.blocks[0].content);
    assert_eq!(with_close.diagnostics.len(), 1);
    assert_eq!(with_close.diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_out_of_order_use_names_both_phases() {
    let doc = parse("--- meta\nversion: 1\n\n--- use: x\n\n--- core/text\nHi");
    let errors = ordering_errors(&doc);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("use"));
    assert!(errors[0].contains("meta"));
}

#[rstest]
#[case::canonical(
    "--- use: core\n--- theme: default\n--- preset: rounded\n--- meta\nversion: 2\n--- style\ncore/text\n  color: red\n--- core/text\nHi"
)]
#[case::define_between_use_and_meta(
    "--- use: core\n--- define-theme: brand\naccent: red\n--- meta\nversion: 2\n--- core/text\nHi"
)]
#[case::blocks_only("--- core/text\nHi\n--- core/divider")]
#[case::repeated_style("--- style\na: b\n--- style\nc: d\n--- core/text\nHi")]
fn test_well_ordered_documents(#[case] source: &str) {
    let doc = parse(source);
    assert!(ordering_errors(&doc).is_empty(), "{:?}", doc.diagnostics);
}

#[rstest]
#[case::style_after_block("--- core/text\nHi\n--- style\na: b", "style")]
#[case::theme_after_meta("--- meta\nversion: 1\n--- theme: default", "theme")]
#[case::use_after_style("--- style\na: b\n--- use: core", "use")]
fn test_out_of_order_directives(#[case] source: &str, #[case] directive: &str) {
    let doc = parse(source);
    let errors = ordering_errors(&doc);
    assert_eq!(errors.len(), 1, "{:?}", doc.diagnostics);
    assert!(errors[0].contains(directive));
    assert!(!doc.is_fatal());
}

#[test]
fn test_newsletter_document() {
    let source = "\
--- use: core
--- theme: default

--- meta
version: 2
title: Weekly digest

--- style
accent: #e11d48

core/heading
  color: $accent

--- core/section: intro
--- core/heading
level: 1

This week
--- core/text

First paragraph.

Second paragraph.
--- /core/section

--- core/button
url: https://example.com

Read more
";
    let doc = parse(source);
    assert!(doc.diagnostics.is_empty(), "{:?}", doc.diagnostics);
    assert_eq!(doc.version, Some(2));
    assert_eq!(doc.uses, vec!["core"]);
    assert_eq!(doc.themes, vec!["default"]);
    assert_eq!(doc.meta.get("title").map(String::as_str), Some("Weekly digest"));
    assert_eq!(doc.styles.len(), 1);
    assert!(doc.styles[0].text.starts_with("accent: #e11d48"));

    assert_doc(&doc)
        .block_count(2)
        .block(0, |section| {
            section
                .block_type("core/section")
                .label(Some("intro"))
                .child_count(2)
                .child(0, |heading| {
                    heading
                        .block_type("core/heading")
                        .property("level", "1")
                        .content("This week");
                })
                .child(1, |text| {
                    text.block_type("core/text")
                        .content("First paragraph.\n\nSecond paragraph.");
                });
        })
        .block(1, |button| {
            button
                .block_type("core/button")
                .property("url", "https://example.com")
                .content("Read more");
        });
}

#[test]
fn test_verbatim_types_follow_options() {
    let source = "--- news/raw\n--- core/text\n--- /news/raw";
    let doc = parse(source);
    assert_doc(&doc).block_count(1).block(0, |raw| {
        raw.block_type("news/raw").child_count(1).child(0, |text| {
            text.block_type("core/text");
        });
    });

    let mut options = ParseOptions::default();
    options.verbatim_types.insert("news/raw".to_string());
    let doc = parse_document(source, &options);
    assert_doc(&doc).block_count(1).block(0, |raw| {
        raw.block_type("news/raw").content("--- core/text");
    });
}

#[test]
fn test_every_diagnostic_has_a_line() {
    let doc = parse(
        "stray\n--- meta\nversion: x\n--- use: a\n--- core/image\nsrc: a\nsrc: b\n@color: red\n--- /nope",
    );
    assert!(doc.diagnostics.len() >= 5, "{:?}", doc.diagnostics);
    assert!(doc.diagnostics.iter().all(|d| d.line >= 1));
}
