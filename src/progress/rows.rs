//! Row bookkeeping for the live display
//!
//! Every tracked work item owns one screen row, assigned the first time its
//! key is seen. The row count doubles as the cursor position: the cursor sits
//! on the line just below the last row, and untracked output advances it.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RowRegistry {
    rows: HashMap<String, usize>,
    lines: usize,
}

impl RowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row of `key`, assigning the next free row on first sight.
    pub fn row_for(&mut self, key: &str) -> usize {
        if let Some(&row) = self.rows.get(key) {
            return row;
        }
        let row = self.lines;
        self.rows.insert(key.to_string(), row);
        self.lines += 1;
        row
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.rows.get(key).copied()
    }

    /// Lines written so far, which is also the next row to assign
    pub fn len(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Account for `lines` lines of untracked output below the rows.
    pub fn advance(&mut self, lines: usize) {
        self.lines += lines;
    }

    /// Lines the cursor must move up from the bottom to reach `row`
    pub fn distance_to(&self, row: usize) -> usize {
        self.lines.saturating_sub(row)
    }
}
