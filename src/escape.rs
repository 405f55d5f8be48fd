//! ANSI escape sequence constants and helpers
//!
//! This module centralizes the terminal escape sequences the progress
//! display uses to redraw rows in place.

// === Cursor Control ===

/// Save current cursor position
pub const CURSOR_SAVE: &str = "\x1b[s";

/// Restore previously saved cursor position
pub const CURSOR_RESTORE: &str = "\x1b[u";

/// Move cursor up `n` lines, keeping the column
#[inline]
pub fn cursor_up(n: usize) -> String {
    format!("\x1b[{}A", n)
}

// === Line Control ===

/// Erase the entire current line
pub const ERASE_LINE: &str = "\x1b[2K";

/// Return to column 1
pub const CARRIAGE_RETURN: &str = "\r";

// === Progress Glyphs ===

pub mod glyph {
    /// Completed portion of a progress bar
    pub const FILLED: char = '█';

    /// Remaining portion of a progress bar
    pub const EMPTY: char = '░';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_up_formats_count() {
        assert_eq!(cursor_up(1), "\x1b[1A");
        assert_eq!(cursor_up(12), "\x1b[12A");
    }
}
