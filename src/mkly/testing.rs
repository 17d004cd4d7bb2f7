//! Testing utilities for document assertions
//!
//!     Tests over parsed documents should assert on the structure deeply rather than on counts
//!     alone. [`assert_doc`] provides a fluent API over the block tree:
//!
//!     ```rust,ignore
//!     use mkly::mkly::testing::assert_doc;
//!
//!     assert_doc(&doc).block_count(1).block(0, |section| {
//!         section
//!             .block_type("core/section")
//!             .child_count(2)
//!             .child(0, |text| {
//!                 text.block_type("core/text").content("Hello");
//!             });
//!     });
//!     ```
//!
//!     Failure messages carry the path of the block under test (`blocks[0].children[1]`) and a
//!     summary of its siblings.

use crate::mkly::ast::{Block, Document};

/// Start an assertion chain on a document.
pub fn assert_doc(doc: &Document) -> DocumentAssertion<'_> {
    DocumentAssertion { doc }
}

fn summarize_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.block_type.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct DocumentAssertion<'a> {
    doc: &'a Document,
}

impl<'a> DocumentAssertion<'a> {
    /// Assert the number of top-level blocks
    pub fn block_count(self, expected: usize) -> Self {
        let actual = self.doc.blocks.len();
        assert_eq!(
            actual,
            expected,
            "Expected {} blocks, found {} blocks: [{}]",
            expected,
            actual,
            summarize_blocks(&self.doc.blocks)
        );
        self
    }

    /// Assert on a specific top-level block by index
    pub fn block<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(BlockAssertion<'a>),
    {
        assert!(
            index < self.doc.blocks.len(),
            "Block index {} out of bounds (document has {} blocks)",
            index,
            self.doc.blocks.len()
        );
        assertion(BlockAssertion {
            block: &self.doc.blocks[index],
            context: format!("blocks[{}]", index),
        });
        self
    }
}

pub struct BlockAssertion<'a> {
    block: &'a Block,
    context: String,
}

impl<'a> BlockAssertion<'a> {
    pub fn block_type(self, expected: &str) -> Self {
        assert_eq!(
            self.block.block_type, expected,
            "{}: expected block type '{}', found '{}'",
            self.context, expected, self.block.block_type
        );
        self
    }

    pub fn label(self, expected: Option<&str>) -> Self {
        assert_eq!(
            self.block.label.as_deref(),
            expected,
            "{}: unexpected label",
            self.context
        );
        self
    }

    pub fn property(self, key: &str, expected: &str) -> Self {
        assert_eq!(
            self.block.property(key),
            Some(expected),
            "{}: property '{}' mismatch (properties: {:?})",
            self.context,
            key,
            self.block.properties
        );
        self
    }

    pub fn property_count(self, expected: usize) -> Self {
        assert_eq!(
            self.block.properties.len(),
            expected,
            "{}: expected {} properties, found {:?}",
            self.context,
            expected,
            self.block.properties
        );
        self
    }

    pub fn content(self, expected: &str) -> Self {
        assert_eq!(
            self.block.content, expected,
            "{}: content mismatch",
            self.context
        );
        self
    }

    pub fn content_contains(self, expected: &str) -> Self {
        assert!(
            self.block.content.contains(expected),
            "{}: expected content to contain '{}', found '{}'",
            self.context,
            expected,
            self.block.content
        );
        self
    }

    /// Assert the first and last source line of the block
    pub fn lines(self, start: usize, end: usize) -> Self {
        assert_eq!(
            (self.block.range.start, self.block.range.end),
            (start, end),
            "{}: line range mismatch",
            self.context
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        let actual = self.block.children.len();
        assert_eq!(
            actual,
            expected,
            "{}: expected {} children, found {} children: [{}]",
            self.context,
            expected,
            actual,
            summarize_blocks(&self.block.children)
        );
        self
    }

    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(BlockAssertion<'a>),
    {
        assert!(
            index < self.block.children.len(),
            "{}: child index {} out of bounds ({} children)",
            self.context,
            index,
            self.block.children.len()
        );
        assertion(BlockAssertion {
            block: &self.block.children[index],
            context: format!("{}.children[{}]", self.context, index),
        });
        self
    }
}
