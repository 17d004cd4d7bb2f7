//! The StyleGraph engine
//!
//!     Each `--- style` section of a document holds text in mkly's style sub-language. This
//!     module parses that text into a [`StyleGraph`], writes graphs back out canonically, and
//!     compiles them to cascade-layered CSS.
//!
//!         style text --parser--> StyleGraph --serializer--> canonical style text
//!                                    |
//!                                    +------compiler------> CSS
//!
//!     Modules:
//!         - [lexer](lexer): logos tokens for style text and values
//!         - [graph](graph): the graph value type and its editing API
//!         - [parser](parser): both dialects (indentation and braces)
//!         - [serializer](serializer): canonical text output
//!         - [compiler](compiler): selectors, rules and cascade layers
//!         - [variables](variables): `$name` resolution and custom-property names
//!
//!     Style problems are never errors; the parser records [`StyleWarning`]s on the graph and
//!     the compile step turns them into document diagnostics.

pub mod compiler;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod serializer;
pub mod variables;

pub use compiler::{compile_graph, CssOptions, Layer, LayeredCss};
pub use graph::{RuleKey, StyleGraph, StyleRule, StyleWarning, Target, RAW_SELECTOR};
pub use parser::parse_style;
pub use serializer::serialize;
pub use variables::{VariableMap, VariableMode};
