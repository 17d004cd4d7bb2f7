//! The StyleGraph value type
//!
//!     A [`StyleGraph`] is the canonical model of a style section: an ordered list of
//!     variables and an ordered list of [`StyleRule`]s. Each rule is keyed by a [`RuleKey`]
//!     (block type, target, optional label) and holds an ordered property list that is never
//!     empty.
//!
//!     Graphs are values. Every editing operation returns a new graph and leaves the receiver
//!     untouched, so a graph can be shared by any number of readers.
//!
//!     Values are stored the way style text can write them: comments and a trailing semicolon
//!     are dropped, and an empty value sets nothing.
//!
//! Targets
//!
//!     A rule targets the block itself, a pseudo state of it, a named sub-element, or a
//!     descendant tag or class:
//!
//!         core/card            Base
//!           :hover             Pseudo(":hover")
//!           .img               Element { name: "img", pseudo: None }
//!           .img::after        Element { name: "img", pseudo: Some("::after") }
//!           >p                 Descendant("p")
//!
//!     Raw CSS selectors are stored under the [`RAW_SELECTOR`] block type with a
//!     [`Target::Selector`] holding the full selector text.

use super::parser::clean_value;
use super::variables::{resolve, VariableMap};
use serde::{Serialize, Serializer};
use std::fmt;

/// Block type under which raw CSS selector rules are stored.
pub const RAW_SELECTOR: &str = "__raw";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Base,
    /// `:hover`, `::before`; stored with its colons
    Pseudo(String),
    Element {
        name: String,
        pseudo: Option<String>,
    },
    /// Tag or class below the block, stored without the `>`
    Descendant(String),
    /// A raw CSS selector, verbatim
    Selector(String),
}

impl Target {
    pub fn pseudo(pseudo: impl Into<String>) -> Self {
        Target::Pseudo(pseudo.into())
    }

    pub fn element(name: impl Into<String>) -> Self {
        Target::Element {
            name: name.into(),
            pseudo: None,
        }
    }

    pub fn descendant(selector: impl Into<String>) -> Self {
        Target::Descendant(selector.into())
    }

    pub fn selector(selector: impl Into<String>) -> Self {
        Target::Selector(selector.into())
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Target::Base)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Base => write!(f, "self"),
            Target::Pseudo(pseudo) => write!(f, "{}", pseudo),
            Target::Element { name, pseudo } => {
                write!(f, ".{}{}", name, pseudo.as_deref().unwrap_or(""))
            }
            Target::Descendant(selector) => write!(f, ">{}", selector),
            Target::Selector(selector) => write!(f, "{}", selector),
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Identity of a rule within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleKey {
    pub block_type: String,
    pub target: Target,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RuleKey {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            target: Target::Base,
            label: None,
        }
    }

    /// Key of a raw CSS selector rule.
    pub fn raw(selector: impl Into<String>) -> Self {
        Self {
            block_type: RAW_SELECTOR.to_string(),
            target: Target::Selector(selector.into()),
            label: None,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_raw(&self) -> bool {
        self.block_type == RAW_SELECTOR
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleRule {
    #[serde(flatten)]
    pub key: RuleKey,
    pub properties: Vec<(String, String)>,
}

impl StyleRule {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, name: &str, value: &str) {
        match self.properties.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.properties.push((name.to_string(), value.to_string())),
        }
    }
}

/// A recoverable problem found while parsing style text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleWarning {
    /// 1-based line within the style text
    pub line: usize,
    pub message: String,
}

impl StyleWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleGraph {
    pub variables: Vec<(String, String)>,
    pub rules: Vec<StyleRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<StyleWarning>,
}

impl StyleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse style text in either dialect.
    pub fn parse(text: &str) -> Self {
        super::parser::parse_style(text)
    }

    /// Canonical text form; see [serializer](super::serializer).
    pub fn serialize(&self) -> String {
        super::serializer::serialize(self)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.rules.is_empty()
    }

    /// Value of a variable, with or without its `$`.
    pub fn variable(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix('$').unwrap_or(name);
        self.variables
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn rule(&self, key: &RuleKey) -> Option<&StyleRule> {
        self.rules.iter().find(|r| &r.key == key)
    }

    /// All rules for one block type, in graph order.
    pub fn rules_for<'a>(&'a self, block_type: &'a str) -> impl Iterator<Item = &'a StyleRule> {
        self.rules
            .iter()
            .filter(move |r| r.key.block_type == block_type)
    }

    /// Combine two graphs; on conflicts `other` wins.
    ///
    /// Variables and rules already present keep their position, new ones are appended.
    pub fn merge(&self, other: &StyleGraph) -> StyleGraph {
        let mut merged = self.clone();
        for (name, value) in &other.variables {
            merged.put_variable(name, value);
        }
        for rule in &other.rules {
            merged.absorb(rule.key.clone(), &rule.properties);
        }
        merged.warnings.extend(other.warnings.iter().cloned());
        merged
    }

    pub fn set_variable(&self, name: &str, value: &str) -> StyleGraph {
        let mut graph = self.clone();
        graph.put_variable(name.strip_prefix('$').unwrap_or(name), value);
        graph
    }

    pub fn remove_variable(&self, name: &str) -> StyleGraph {
        let name = name.strip_prefix('$').unwrap_or(name);
        let mut graph = self.clone();
        graph.variables.retain(|(k, _)| k != name);
        graph
    }

    pub fn set_property(&self, key: &RuleKey, property: &str, value: &str) -> StyleGraph {
        let mut graph = self.clone();
        graph.absorb(key.clone(), &[(property.to_string(), value.to_string())]);
        graph
    }

    /// Drop one property; a rule left without properties disappears.
    pub fn remove_property(&self, key: &RuleKey, property: &str) -> StyleGraph {
        let mut graph = self.clone();
        if let Some(rule) = graph.rules.iter_mut().find(|r| &r.key == key) {
            rule.properties.retain(|(k, _)| k != property);
        }
        graph.rules.retain(|r| !r.properties.is_empty());
        graph
    }

    pub fn remove_rule(&self, key: &RuleKey) -> StyleGraph {
        let mut graph = self.clone();
        graph.rules.retain(|r| &r.key != key);
        graph
    }

    /// Substitute `$name` references with this graph's variable values.
    ///
    /// References to other variables are followed a bounded number of times; unknown names
    /// are left as written.
    pub fn resolve_value(&self, value: &str) -> String {
        let variables: VariableMap = self.variables.iter().cloned().collect();
        resolve(value, &variables)
    }

    pub(crate) fn put_variable(&mut self, name: &str, value: &str) {
        let value = clean_value(value);
        if value.is_empty() {
            return;
        }
        match self.variables.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.variables.push((name.to_string(), value)),
        }
    }

    /// Add properties to the rule with this key, creating it when absent.
    pub(crate) fn absorb(&mut self, key: RuleKey, properties: &[(String, String)]) {
        let properties: Vec<(String, String)> = properties
            .iter()
            .map(|(name, value)| (name.clone(), clean_value(value)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if properties.is_empty() {
            return;
        }
        let index = match self.rules.iter().position(|r| r.key == key) {
            Some(index) => index,
            None => {
                self.rules.push(StyleRule {
                    key,
                    properties: Vec::new(),
                });
                self.rules.len() - 1
            }
        };
        for (name, value) in &properties {
            self.rules[index].set(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StyleGraph {
        let mut graph = StyleGraph::new();
        graph.put_variable("accent", "#e11d48");
        graph.absorb(
            RuleKey::new("core/card"),
            &[("padding".to_string(), "16px".to_string())],
        );
        graph.absorb(
            RuleKey::new("core/card").with_target(Target::pseudo(":hover")),
            &[("color".to_string(), "$accent".to_string())],
        );
        graph
    }

    #[test]
    fn test_mutations_return_new_graphs() {
        let graph = sample();
        let edited = graph.set_property(&RuleKey::new("core/card"), "margin", "0");
        assert_eq!(graph.rules[0].properties.len(), 1);
        assert_eq!(edited.rules[0].property("margin"), Some("0"));
    }

    #[test]
    fn test_remove_last_property_drops_rule() {
        let key = RuleKey::new("core/card").with_target(Target::pseudo(":hover"));
        let graph = sample().remove_property(&key, "color");
        assert!(graph.rule(&key).is_none());
        assert_eq!(graph.rules.len(), 1);
    }

    #[test]
    fn test_merge_other_wins_and_keeps_order() {
        let other = StyleGraph::new()
            .set_variable("$accent", "#000")
            .set_variable("muted", "#999")
            .set_property(&RuleKey::new("core/card"), "padding", "8px");
        let merged = sample().merge(&other);
        assert_eq!(
            merged.variables,
            vec![
                ("accent".to_string(), "#000".to_string()),
                ("muted".to_string(), "#999".to_string())
            ]
        );
        assert_eq!(merged.rules[0].property("padding"), Some("8px"));
        assert_eq!(merged.rules.len(), 2);
    }

    #[test]
    fn test_variable_lookup_and_removal() {
        let graph = sample();
        assert_eq!(graph.variable("$accent"), Some("#e11d48"));
        assert!(graph.remove_variable("accent").variable("accent").is_none());
        assert_eq!(graph.rules_for("core/card").count(), 2);
        assert!(graph.remove_rule(&RuleKey::new("core/card")).rules_for("core/card").count() == 1);
    }

    #[test]
    fn test_resolve_value_follows_references() {
        let graph = sample()
            .set_variable("border", "1px solid $accent")
            .set_variable("loop", "$loop");
        assert_eq!(graph.resolve_value("$border"), "1px solid #e11d48");
        assert_eq!(graph.resolve_value("$missing 2px"), "$missing 2px");
        assert_eq!(graph.resolve_value("$loop"), "$loop");
    }

    #[test]
    fn test_values_are_stored_as_style_text_writes_them() {
        let key = RuleKey::new("core/card");
        let graph = StyleGraph::new()
            .set_variable("accent", "// todo")
            .set_variable("muted", " #999; ")
            .set_property(&key, "padding", "")
            .set_property(&key, "margin", "0 // reset");
        assert_eq!(graph.variables, vec![("muted".to_string(), "#999".to_string())]);
        assert_eq!(graph.rules.len(), 1);
        assert_eq!(graph.rules[0].properties, vec![("margin".to_string(), "0".to_string())]);

        let empty = StyleGraph::new().set_property(&key, "padding", " ");
        assert!(empty.rules.is_empty());
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Base.to_string(), "self");
        assert_eq!(
            Target::Element {
                name: "img".to_string(),
                pseudo: Some(":hover".to_string())
            }
            .to_string(),
            ".img:hover"
        );
        assert_eq!(Target::descendant("p").to_string(), ">p");
    }
}
