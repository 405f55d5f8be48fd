//! Progress line composition
//!
//! A tracked row reads `<id>: <status>`, followed by ` [<bar>] <size>` when
//! both counts are known and the terminal leaves enough room for the bar, or
//! just ` <size>` when it does not.

use unicode_width::UnicodeWidthStr;

use crate::escape::glyph;

/// Columns reserved around the bar for separators and brackets
pub const BAR_MARGIN: usize = 10;

/// Bars this narrow or narrower are dropped
pub const MIN_BAR_WIDTH: usize = 10;

/// Number of filled cells for `current` out of `total` in a bar of `width`.
///
/// A zero total fills nothing; overshoot is clamped to the full width.
pub fn filled_cells(current: u64, total: u64, width: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let filled = (width as u128 * current as u128) / total as u128;
    filled.min(width as u128) as usize
}

/// Build a bar of exactly `width` glyphs.
pub fn render_bar(current: u64, total: u64, width: usize) -> String {
    let filled = filled_cells(current, total, width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(glyph::FILLED).take(filled));
    bar.extend(std::iter::repeat(glyph::EMPTY).take(width - filled));
    bar
}

/// Human-readable byte count (B, KB, MB, GB, ...)
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Width left for the bar once everything else on the line is laid out.
pub fn bar_width(columns: usize, id: &str, status: &str, size: &str) -> usize {
    columns.saturating_sub(id.width() + status.width() + size.width() + BAR_MARGIN)
}

/// Compose the text of a tracked row for a terminal `columns` wide.
pub fn compose_line(
    id: &str,
    status: &str,
    current: Option<u64>,
    total: Option<u64>,
    columns: usize,
) -> String {
    let (Some(current), Some(total)) = (current, total) else {
        return format!("{}: {}", id, status);
    };

    let size = format!("{}/{}", format_size(current), format_size(total));
    let width = bar_width(columns, id, status, &size);

    if width > MIN_BAR_WIDTH {
        format!("{}: {} [{}] {}", id, status, render_bar(current, total, width), size)
    } else {
        format!("{}: {} {}", id, status, size)
    }
}
