//! Single-line editor used by the jump, search and execute prompts.
//!
//! The caller owns the [LineEditor], feeds it key events and reacts to the returned
//! [EditEvent]. Nothing is shared between prompts except the history passed in.

use crate::app::history::History;

use crossterm::event::{KeyCode::*, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

/// What a key did to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// Text changed.
    Edited,
    /// Only the cursor moved.
    Moved,
    Confirm,
    Cancel,
    Ignored,
}

#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    text: String,
    /// Byte offset, always on a char boundary.
    cursor: usize,
    history_pos: Option<usize>,
    stash: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    // Accessors

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Terminal cells between the start of the line and the cursor.
    pub fn cursor_width(&self) -> usize {
        UnicodeWidthStr::width(&self.text[..self.cursor])
    }

    pub fn apply(&mut self, key: KeyEvent, history: &History) -> EditEvent {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                Char('a') => self.home(),
                Char('e') => self.end(),
                Char('b') => self.left(),
                Char('f') => self.right(),
                Char('h') => self.backspace(),
                Char('u') => self.clear(),
                Char('w') => self.delete_word(),
                Char('c') | Char('g') => EditEvent::Cancel,
                _ => EditEvent::Ignored,
            };
        }

        match key.code {
            Enter => EditEvent::Confirm,
            Esc => EditEvent::Cancel,
            Backspace => self.backspace(),
            Delete => self.delete(),
            Left => self.left(),
            Right => self.right(),
            Home => self.home(),
            End => self.end(),
            Up => self.history_prev(history),
            Down => self.history_next(history),
            Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                self.text.insert(self.cursor, c);
                self.cursor += c.len_utf8();
                EditEvent::Edited
            }
            _ => EditEvent::Ignored,
        }
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    fn left(&mut self) -> EditEvent {
        match self.prev_boundary() {
            Some(i) => {
                self.cursor = i;
                EditEvent::Moved
            }
            None => EditEvent::Ignored,
        }
    }

    fn right(&mut self) -> EditEvent {
        match self.next_boundary() {
            Some(i) => {
                self.cursor = i;
                EditEvent::Moved
            }
            None => EditEvent::Ignored,
        }
    }

    fn home(&mut self) -> EditEvent {
        self.cursor = 0;
        EditEvent::Moved
    }

    fn end(&mut self) -> EditEvent {
        self.cursor = self.text.len();
        EditEvent::Moved
    }

    /// Backspace on an empty line abandons the prompt.
    fn backspace(&mut self) -> EditEvent {
        if self.text.is_empty() {
            return EditEvent::Cancel;
        }
        match self.prev_boundary() {
            Some(i) => {
                self.text.drain(i..self.cursor);
                self.cursor = i;
                EditEvent::Edited
            }
            None => EditEvent::Ignored,
        }
    }

    fn delete(&mut self) -> EditEvent {
        match self.next_boundary() {
            Some(i) => {
                self.text.drain(self.cursor..i);
                EditEvent::Edited
            }
            None => EditEvent::Ignored,
        }
    }

    fn clear(&mut self) -> EditEvent {
        self.text.clear();
        self.cursor = 0;
        EditEvent::Edited
    }

    /// Deletes back to the start of the previous word.
    fn delete_word(&mut self) -> EditEvent {
        let before = &self.text[..self.cursor];
        let trimmed = before.trim_end();
        let start = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());
        if start == self.cursor {
            return EditEvent::Ignored;
        }
        self.text.drain(start..self.cursor);
        self.cursor = start;
        EditEvent::Edited
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    fn history_prev(&mut self, history: &History) -> EditEvent {
        let pos = match self.history_pos {
            None if history.is_empty() => return EditEvent::Ignored,
            None => {
                self.stash = self.text.clone();
                history.len() - 1
            }
            Some(0) => return EditEvent::Ignored,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        let line = history.get(pos).unwrap_or_default().to_string();
        self.set_text(&line);
        EditEvent::Edited
    }

    fn history_next(&mut self, history: &History) -> EditEvent {
        let Some(p) = self.history_pos else {
            return EditEvent::Ignored;
        };
        if p + 1 < history.len() {
            self.history_pos = Some(p + 1);
            let line = history.get(p + 1).unwrap_or_default().to_string();
            self.set_text(&line);
        } else {
            self.history_pos = None;
            let stash = std::mem::take(&mut self.stash);
            self.set_text(&stash);
        }
        EditEvent::Edited
    }
}
