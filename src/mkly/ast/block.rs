//! Content blocks
//!
//!     A block is the unit of content in a mkly document: a kit-qualified type tag
//!     (`core/text`, or bare `text` resolved against the kits in use), an optional instance
//!     label, a property mapping, free-text content and ordered children.
//!
//!     Blocks are frozen once the parser flushes them. Children attach only when a matching
//!     close directive collapses the blocks opened after a container into it.

use super::range::Range;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
    pub range: Range,
}

impl Block {
    pub fn new(block_type: impl Into<String>, line: usize) -> Self {
        Self {
            block_type: block_type.into(),
            label: None,
            properties: BTreeMap::new(),
            content: String::new(),
            children: Vec::new(),
            range: Range::line(line),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The kit part of a qualified type (`core` for `core/text`).
    pub fn kit_name(&self) -> Option<&str> {
        self.block_type.split_once('/').map(|(kit, _)| kit)
    }

    /// The type without its kit qualifier (`text` for `core/text`).
    pub fn short_type(&self) -> &str {
        self.block_type
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.block_type)
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_parts() {
        let block = Block::new("core/text", 1);
        assert_eq!(block.kit_name(), Some("core"));
        assert_eq!(block.short_type(), "text");

        let bare = Block::new("card", 1);
        assert_eq!(bare.kit_name(), None);
        assert_eq!(bare.short_type(), "card");
    }
}
