//! Grid drawing for spy.
//!
//! Draws the current page of the listing column by column. Each cell is a directory marker,
//! the name in its rule color and, when a detail mode is active, the size or time column.
//! The cursor cell is reversed and the search match is underlined.

use crate::app::nav::MARKER_WIDTH;
use crate::core::formatter::{
    SIZE_COLUMN_WIDTH, format_file_size, format_file_time, sanitize_name, truncate_to_width,
};
use crate::core::{DetailMode, FileEntry};
use crate::ui::Screen;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
};
use std::ops::Range;
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Draws the page holding the cursor into `area`.
pub(crate) fn draw_grid(buf: &mut Buffer, area: Rect, screen: &Screen<'_>) {
    let nav = screen.nav;
    let layout = nav.layout();
    let listing = nav.listing();
    if listing.is_empty() || area.height == 0 {
        return;
    }

    let width = area.width as usize;
    let cols = layout.cols();
    let page = nav.pos().page;
    let name_width = listing.max_name_width();

    for idx in layout.page_range(page) {
        let Some(entry) = listing.get(idx) else {
            break;
        };
        let pos = layout.index_to_pos(idx);
        if pos.row >= area.height as usize {
            continue;
        }

        let x = pos.col * width / cols;
        let next_x = (pos.col + 1) * width / cols;
        let cell_width = next_x.saturating_sub(x).saturating_sub(1).max(1);

        let line = cell_line(entry, screen, idx == nav.current(), name_width, cell_width);
        buf.set_line(
            area.x + x as u16,
            area.y + pos.row as u16,
            &line,
            cell_width as u16,
        );
    }
}

fn cell_line<'a>(
    entry: &'a FileEntry,
    screen: &Screen<'_>,
    selected: bool,
    name_width: usize,
    cell_width: usize,
) -> Line<'a> {
    let nav = screen.nav;
    let dir = nav.listing().dir();
    let color = screen.colors.color_for(entry, dir, nav.is_tagged(entry));

    let mut base = Style::default().fg(color);
    if selected {
        base = base.add_modifier(Modifier::REVERSED);
    }

    let marker = if entry.is_dir() { "* " } else { "  " };
    let mut spans = vec![Span::styled(marker, base)];

    let raw = entry.name_str();
    let name = sanitize_name(&raw).into_owned();
    let room = cell_width.saturating_sub(MARKER_WIDTH);
    let name = truncate_to_width(&name, room).into_owned();
    let highlight = screen.search.highlight(&name);
    spans.extend(name_spans(name, highlight, base));

    let detail = nav.detail();
    if detail != DetailMode::None {
        let used = UnicodeWidthStr::width(spans_text(&spans).as_str());
        let pad = (name_width + MARKER_WIDTH).saturating_sub(used) + 1;
        spans.push(Span::styled(" ".repeat(pad), base));
        spans.push(Span::styled(detail_text(entry, dir, detail), base));
    }

    Line::from(spans)
}

fn spans_text(spans: &[Span<'_>]) -> String {
    spans.iter().map(|s| s.content.as_ref()).collect()
}

/// Splits `name` around the highlighted byte range.
fn name_spans(name: String, highlight: Option<Range<usize>>, base: Style) -> Vec<Span<'static>> {
    let split = highlight.and_then(|r| {
        Some((
            name.get(..r.start)?.to_string(),
            name.get(r.clone())?.to_string(),
            name.get(r.end..)?.to_string(),
        ))
    });
    match split {
        Some((before, matched, after)) => vec![
            Span::styled(before, base),
            Span::styled(matched, base.add_modifier(Modifier::UNDERLINED)),
            Span::styled(after, base),
        ],
        None => vec![Span::styled(name, base)],
    }
}

fn detail_text(entry: &FileEntry, dir: &Path, detail: DetailMode) -> String {
    let attrs = entry.attrs(dir);
    match detail {
        DetailMode::None => String::new(),
        DetailMode::Size => format!("{:>SIZE_COLUMN_WIDTH$}", format_file_size(attrs.size())),
        DetailMode::Time => format_file_time(attrs.modified()),
    }
}
