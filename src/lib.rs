//! # mkly
//!
//! A compiler for the mkly markup language.
//!
//! mkly documents are line oriented: directives (`--- name`) open blocks and special sections,
//! `key: value` lines set properties, everything else is content. A document compiles to an
//! HTML fragment plus CSS arranged in four cascade layers (kit, theme, preset, user).
//!
//! File Layout
//!
//!     src/mkly
//!       ├── ast        Document model, source ranges and diagnostics
//!       ├── token      Line token types
//!       ├── lexing     The line tokenizer
//!       ├── parsing    Directive and block parser (document AST)
//!       ├── style      The StyleGraph engine: parse, serialize, compile to CSS
//!       ├── kit        Block registries, themes, presets, plugins and the built-in core kit
//!       ├── compile    The compile orchestrator
//!       ├── config     Configuration loading
//!       └── testing    Assertion helpers for tests
//!
//! For the end to end entry point see [compile](mkly::compile::compile).

#![allow(rustdoc::invalid_html_tags)]

pub mod mkly;

pub use mkly::compile::{compile, compile_source, CompileOptions, CompileResult};
pub use mkly::parsing::{parse_document, ParseOptions};
pub use mkly::style::StyleGraph;
