//! Source ranges used by the instruction debug tables.

use serde::{Deserialize, Serialize};

/// A row/column position inside one module's source text. Both are 0-based.
///
/// # Examples
///
/// ```
/// use core_types::TextPosition;
///
/// let pos = TextPosition::new(10, 5);
/// assert_eq!(pos.row, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextPosition {
    /// Row number, starting at 0
    pub row: usize,
    /// Column number, starting at 0
    pub column: usize,
}

impl TextPosition {
    /// Create a new position
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A range of source text in the module identified by `code_index`.
///
/// # Examples
///
/// ```
/// use core_types::{TextPosition, TextRange};
///
/// let range = TextRange::new(0, TextPosition::new(3, 4), TextPosition::new(3, 12));
/// assert_eq!(range.row(), 3);
/// assert!(range.same_row(&TextRange::line(0, 3)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    /// Index into the module code list of the owning debug table
    pub code_index: usize,
    /// First character of the range
    pub start: TextPosition,
    /// Last character of the range
    pub end: TextPosition,
}

impl TextRange {
    /// Create a new range
    pub fn new(code_index: usize, start: TextPosition, end: TextPosition) -> Self {
        Self {
            code_index,
            start,
            end,
        }
    }

    /// A range covering column 0 of a single row.
    pub fn line(code_index: usize, row: usize) -> Self {
        let position = TextPosition::new(row, 0);
        Self::new(code_index, position, position)
    }

    /// Row where the range starts
    pub fn row(&self) -> usize {
        self.start.row
    }

    /// Whether both ranges start on the same row of the same module.
    pub fn same_row(&self, other: &TextRange) -> bool {
        self.code_index == other.code_index && self.start.row == other.start.row
    }
}
