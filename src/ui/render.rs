//! UI renderer implementation.
//!
//! Splits the frame into the header line, the page indicator, the grid and the prompt line,
//! and draws everything but the grid itself.

use crate::ui::panes;
use crate::ui::{BottomLine, Screen};

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

/// Render function which renders the entire terminal UI for spy on each frame.
pub fn render(frame: &mut Frame, screen: &Screen<'_>) {
    let area = frame.area();
    if area.height == 0 || area.width == 0 {
        return;
    }

    render_header(frame, screen, line_at(area, 0));

    let layout = screen.nav.layout();
    if layout.pages() > 1 && area.height > 1 {
        let page = format!("Page {}/{}", screen.nav.pos().page + 1, layout.pages());
        frame.render_widget(Paragraph::new(page), line_at(area, 1));
    }

    if area.height > 3 {
        let grid = Rect {
            x: area.x,
            y: area.y + 2,
            width: area.width,
            height: area.height - 3,
        };
        panes::draw_grid(frame.buffer_mut(), grid, screen);
    }

    if area.height > 1 {
        render_bottom(frame, screen.bottom, line_at(area, area.height - 1));
    }
}

fn line_at(area: Rect, row: u16) -> Rect {
    Rect {
        x: area.x,
        y: area.y + row,
        width: area.width,
        height: 1,
    }
}

fn render_header(frame: &mut Frame, screen: &Screen<'_>, area: Rect) {
    let line = Line::from(vec![
        Span::styled(screen.title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(screen.cwd),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom(frame: &mut Frame, bottom: BottomLine<'_>, area: Rect) {
    match bottom {
        BottomLine::Empty => {}
        BottomLine::Status(msg) => {
            frame.render_widget(Paragraph::new(msg), area);
        }
        BottomLine::Prompt {
            prompt,
            text,
            cursor,
        } => {
            let prompt_width = UnicodeWidthStr::width(prompt);
            let visible = area.width as usize;
            // Scroll long input so the cursor stays on screen.
            let offset = (prompt_width + cursor + 1).saturating_sub(visible);
            let line = format!("{prompt}{text}");
            let shown: String = skip_cells(&line, offset);
            frame.render_widget(Paragraph::new(shown), area);

            let x = (prompt_width + cursor - offset).min(visible.saturating_sub(1));
            frame.set_cursor_position((area.x + x as u16, area.y));
        }
    }
}

/// Drops the first `cells` terminal cells of `s`.
fn skip_cells(s: &str, cells: usize) -> String {
    let mut skipped = 0;
    s.chars()
        .skip_while(|c| {
            if skipped >= cells {
                return false;
            }
            skipped += unicode_width::UnicodeWidthChar::width(*c).unwrap_or(0);
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipping_cells() {
        assert_eq!(skip_cells("abcdef", 0), "abcdef");
        assert_eq!(skip_cells("abcdef", 2), "cdef");
        assert_eq!(skip_cells("日本語", 2), "本語");
    }
}
