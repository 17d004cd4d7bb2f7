//! Line ranges for source tracking
//!
//! mkly is line oriented, so locations are whole lines: every token, block and diagnostic
//! carries 1-based line numbers. Byte offsets only appear in the compiled source map.
//!
//! ## Key Design
//!
//! - **1-based lines**: line 1 is the first line of the source, matching editors.
//! - **Inclusive ranges**: `Range { start: 3, end: 5 }` covers lines 3, 4 and 5.
//! - **No null locations**: the default range is line 0..0, used only for synthetic nodes.

use serde::Serialize;
use std::fmt;

/// An inclusive range of 1-based source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A range covering a single line.
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Grow the range so its end covers `line`.
    pub fn extend_to(&mut self, line: usize) {
        if line > self.end {
            self.end = line;
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_to_only_grows() {
        let mut range = Range::line(3);
        range.extend_to(5);
        range.extend_to(4);
        assert_eq!(range, Range::new(3, 5));
    }

    #[test]
    fn test_end_never_precedes_start() {
        assert_eq!(Range::new(7, 2), Range::line(7));
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::line(4).to_string(), "4");
        assert_eq!(Range::new(4, 9).to_string(), "4..9");
    }
}
