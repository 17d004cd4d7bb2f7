//! Directives and directive phases
//!
//!     Directives must appear in a canonical order of phases:
//!
//!         use → define → theme → meta → style → blocks
//!
//!     The parser keeps a cursor on the furthest phase seen so far. A directive behind the
//!     cursor is still accepted, but produces an ordering error naming the directive and the
//!     phase it violated. Repeating a directive of the current phase is always legal, and the
//!     cursor never moves backwards.

use std::fmt;

/// The canonical buckets directives belong to, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Use,
    Define,
    Theme,
    Meta,
    Style,
    Blocks,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Use => "use",
            Phase::Define => "define",
            Phase::Theme => "theme",
            Phase::Meta => "meta",
            Phase::Style => "style",
            Phase::Blocks => "blocks",
        };
        write!(f, "{}", name)
    }
}

/// What an open directive line introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Meta,
    Style,
    Use,
    Theme,
    Preset,
    DefineTheme,
    DefinePreset,
    /// Anything else opens an ordinary content block.
    Block,
}

impl Directive {
    pub fn from_name(name: &str) -> Self {
        match name {
            "meta" => Directive::Meta,
            "style" => Directive::Style,
            "use" => Directive::Use,
            "theme" => Directive::Theme,
            "preset" => Directive::Preset,
            "define-theme" => Directive::DefineTheme,
            "define-preset" => Directive::DefinePreset,
            _ => Directive::Block,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Directive::Use => Phase::Use,
            Directive::DefineTheme | Directive::DefinePreset => Phase::Define,
            Directive::Theme | Directive::Preset => Phase::Theme,
            Directive::Meta => Phase::Meta,
            Directive::Style => Phase::Style,
            Directive::Block => Phase::Blocks,
        }
    }

    /// Directive keyword, `None` for ordinary blocks.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Directive::Meta => Some("meta"),
            Directive::Style => Some("style"),
            Directive::Use => Some("use"),
            Directive::Theme => Some("theme"),
            Directive::Preset => Some("preset"),
            Directive::DefineTheme => Some("define-theme"),
            Directive::DefinePreset => Some("define-preset"),
            Directive::Block => None,
        }
    }

    pub fn is_special(&self) -> bool {
        !matches!(self, Directive::Block)
    }
}
