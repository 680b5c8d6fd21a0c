//! Display formatting helpers for entries in spy.
//!
//! Formats the detail columns (size, modification time) and measures names in terminal cells
//! so the layout engine can size the grid.

use chrono::{DateTime, Local};
use humansize::{DECIMAL, format_size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use std::borrow::Cow;
use std::time::SystemTime;

/// Width reserved for the size column.
pub const SIZE_COLUMN_WIDTH: usize = 10;
/// Width reserved for the modification time column ("2024-01-31 23:59").
pub const TIME_COLUMN_WIDTH: usize = 16;

/// Formats a file size for the size detail column.
pub fn format_file_size(size: u64) -> String {
    format_size(size, DECIMAL)
}

/// Formats a modification time for the time detail column, in local time.
pub fn format_file_time(time: SystemTime) -> String {
    let dt: DateTime<Local> = time.into();
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Replaces control characters so a name never moves the terminal cursor.
pub fn sanitize_name(name: &str) -> Cow<'_, str> {
    if name.chars().any(char::is_control) {
        Cow::Owned(
            name.chars()
                .map(|c| if c.is_control() { '?' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(name)
    }
}

/// Width of a name in terminal cells, after sanitizing.
pub fn display_width(name: &str) -> usize {
    UnicodeWidthStr::width(sanitize_name(name).as_ref())
}

/// Truncates to at most `max` terminal cells.
pub fn truncate_to_width(s: &str, max: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(max);
    let mut used = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(c);
    }
    Cow::Owned(out)
}
