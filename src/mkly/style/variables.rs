//! Style variables
//!
//!     Variables are written `$name` in style text and in kit, theme and preset CSS. When CSS
//!     is generated they become either custom-property references (`var(--mk-accent)`) or,
//!     for email clients without custom-property support, the literal resolved value.
//!
//!     Well-known theme variables have fixed custom-property names so kit CSS can rely on
//!     them; any other name maps to `--mk-` plus its kebab-case form.

use super::lexer::replace_variables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cascaded variable values, by name without `$`.
pub type VariableMap = BTreeMap<String, String>;

const MAX_RESOLVE_DEPTH: usize = 8;

/// Custom-property names for the well-known theme variables.
const BUILTIN_PROPERTIES: &[(&str, &str)] = &[
    ("accent", "--mk-accent"),
    ("accentHover", "--mk-accent-hover"),
    ("bg", "--mk-background"),
    ("text", "--mk-text-color"),
    ("muted", "--mk-text-muted"),
    ("border", "--mk-border-color"),
    ("radius", "--mk-border-radius"),
    ("fontBody", "--mk-font-family"),
    ("fontHeading", "--mk-heading-font-family"),
    ("spacing", "--mk-spacing"),
];

/// How `$name` references are written into generated CSS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableMode {
    /// `var(--mk-name)`, with the values declared once on the document root
    #[default]
    CustomProperties,
    /// The resolved value itself
    Inline,
}

/// `fontHeading` -> `font-heading`, `card_shadow` -> `card-shadow`.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// Custom-property name for a variable.
pub fn custom_property(name: &str) -> String {
    let name = name.strip_prefix('$').unwrap_or(name);
    BUILTIN_PROPERTIES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, property)| property.to_string())
        .unwrap_or_else(|| format!("--mk-{}", to_kebab_case(name)))
}

/// Substitute references with values, following references inside values.
pub fn resolve(value: &str, variables: &VariableMap) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_RESOLVE_DEPTH {
        let next = replace_variables(&current, |name| variables.get(name).cloned());
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Rewrite `$name` references in CSS text for the given mode.
///
/// In inline mode unknown names still become `var()` references, so the output never
/// carries a bare `$name`.
pub fn substitute(css: &str, mode: VariableMode, variables: &VariableMap) -> String {
    match mode {
        VariableMode::CustomProperties => replace_variables(css, |name| {
            Some(format!("var({})", custom_property(name)))
        }),
        VariableMode::Inline => {
            let resolved = resolve(css, variables);
            replace_variables(&resolved, |name| {
                Some(format!("var({})", custom_property(name)))
            })
        }
    }
}

/// Custom-property declarations for every variable.
pub fn declarations(variables: &VariableMap) -> Vec<(String, String)> {
    variables
        .iter()
        .map(|(name, value)| {
            (
                custom_property(name),
                substitute(value, VariableMode::CustomProperties, variables),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("accent", "--mk-accent")]
    #[case("$bg", "--mk-background")]
    #[case("fontHeading", "--mk-heading-font-family")]
    #[case("cardShadow", "--mk-card-shadow")]
    #[case("hero_height", "--mk-hero-height")]
    fn test_custom_property_names(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(custom_property(name), expected);
    }

    #[test]
    fn test_substitute_modes() {
        let mut vars = VariableMap::new();
        vars.insert("accent".to_string(), "#e11d48".to_string());
        vars.insert("border".to_string(), "1px solid $accent".to_string());

        assert_eq!(
            substitute("color: $accent;", VariableMode::CustomProperties, &vars),
            "color: var(--mk-accent);"
        );
        assert_eq!(
            substitute("border: $border; color: $other;", VariableMode::Inline, &vars),
            "border: 1px solid #e11d48; color: var(--mk-other);"
        );
    }

    #[test]
    fn test_declarations_reference_other_variables() {
        let mut vars = VariableMap::new();
        vars.insert("accent".to_string(), "#e11d48".to_string());
        vars.insert("border".to_string(), "1px solid $accent".to_string());
        assert_eq!(
            declarations(&vars),
            vec![
                ("--mk-accent".to_string(), "#e11d48".to_string()),
                (
                    "--mk-border-color".to_string(),
                    "1px solid var(--mk-accent)".to_string()
                ),
            ]
        );
    }
}
