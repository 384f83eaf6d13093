//! Zero-based source positions shared by every component
//!
//! Global invariants enforced:
//! - Positions are zero-based on both axes once they enter the crate
//! - Ordering is lexicographic: line first, then column

use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-based (line, column) location in a source file
///
/// Stack traces and most editors report one-based positions; convert with
/// [`SourcePosition::from_one_based`] at the boundary and never again.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourcePosition {
    /// Line number (0-indexed)
    pub line: u32,
    /// Column number (0-indexed)
    pub column: u32,
}

impl SourcePosition {
    /// Create a new zero-based position
    pub fn new(line: u32, column: u32) -> Self {
        SourcePosition { line, column }
    }

    /// Convert a one-based (line, column) pair, saturating at zero
    pub fn from_one_based(line: u32, column: u32) -> Self {
        SourcePosition {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }

    /// One-based (line, column) pair for display
    pub fn to_one_based(self) -> (u32, u32) {
        (self.line.saturating_add(1), self.column.saturating_add(1))
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.to_one_based();
        write!(f, "{}:{}", line, column)
    }
}

/// Inclusive range of source positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    /// Create a new range; callers guarantee `start <= end`
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        debug_assert!(start <= end, "range start must not follow its end");
        SourceRange { start, end }
    }

    /// Check if the position lies within the range (both ends inclusive)
    pub fn contains(&self, position: SourcePosition) -> bool {
        self.start <= position && position <= self.end
    }
}
