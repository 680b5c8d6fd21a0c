//! Terminal surface for spy.
//!
//! [Frontend] is the seam between the session and the terminal: drawing a frame, reading keys,
//! and handing the terminal to child processes and back. [CrosstermFrontend] implements it with
//! raw mode, the alternate screen and a ratatui terminal.

use crate::core::signals;
use crate::ui::{self, Screen};

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::time::Duration;

/// Everything the session needs from the terminal.
pub trait Frontend {
    /// Terminal size as (rows, cols).
    fn size(&mut self) -> io::Result<(u16, u16)>;

    fn draw(&mut self, screen: &Screen<'_>) -> io::Result<()>;

    /// Waits up to `timeout` for a key press. `None` on timeout or non-key events.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;

    /// Gives the terminal back to cooked mode so a child process can use it.
    fn release(&mut self) -> io::Result<()>;

    /// Takes the terminal back after [Frontend::release] and forces a full redraw.
    fn reacquire(&mut self) -> io::Result<()>;

    /// Writes a line while released.
    fn echo(&mut self, line: &str) -> io::Result<()>;

    /// Shows `prompt` while released and blocks for one key.
    fn pause(&mut self, prompt: &str) -> io::Result<()>;

    /// Drops whatever is on screen so the next draw repaints everything.
    fn invalidate(&mut self) -> io::Result<()>;
}

pub struct CrosstermFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    released: bool,
}

impl CrosstermFrontend {
    /// Enters raw mode and the alternate screen.
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(CrosstermFrontend {
            terminal,
            released: false,
        })
    }
}

impl Drop for CrosstermFrontend {
    fn drop(&mut self) {
        if !self.released {
            let _ = disable_raw_mode();
            let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show);
        }
    }
}

impl Frontend for CrosstermFrontend {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.height, size.width))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> io::Result<()> {
        self.terminal.draw(|f| ui::render(f, screen))?;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            Event::Resize(_, _) => {
                signals::request_resize();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        self.released = true;
        Ok(())
    }

    fn reacquire(&mut self) -> io::Result<()> {
        if !self.released {
            return self.invalidate();
        }
        execute!(self.terminal.backend_mut(), EnterAlternateScreen, Hide)?;
        enable_raw_mode()?;
        self.released = false;
        self.terminal.clear()
    }

    fn echo(&mut self, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }

    fn pause(&mut self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        enable_raw_mode()?;
        let result = loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break Ok(()),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };
        disable_raw_mode()?;
        writeln!(stdout)?;
        result
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }
}

/// In-memory frontend for tests: keys come from a queue, frames land in a [TestBackend].
///
/// Clones share one script, so a test can keep a handle after boxing a clone into a session.
///
/// [TestBackend]: ratatui::backend::TestBackend
#[cfg(test)]
#[derive(Clone)]
pub(crate) struct ScriptedFrontend {
    inner: std::rc::Rc<std::cell::RefCell<Script>>,
}

#[cfg(test)]
struct Script {
    terminal: Terminal<ratatui::backend::TestBackend>,
    keys: std::collections::VecDeque<KeyEvent>,
    echoed: Vec<String>,
    pauses: usize,
    draws: usize,
    released: bool,
}

#[cfg(test)]
impl ScriptedFrontend {
    pub(crate) fn new(rows: u16, cols: u16) -> Result<Self, Box<dyn std::error::Error>> {
        let terminal = Terminal::new(ratatui::backend::TestBackend::new(cols, rows))?;
        let script = Script {
            terminal,
            keys: std::collections::VecDeque::new(),
            echoed: Vec::new(),
            pauses: 0,
            draws: 0,
            released: false,
        };
        Ok(ScriptedFrontend {
            inner: std::rc::Rc::new(std::cell::RefCell::new(script)),
        })
    }

    pub(crate) fn push_key(&self, key: KeyEvent) {
        self.inner.borrow_mut().keys.push_back(key);
    }

    /// Queues every character of `s` as a plain key press.
    pub(crate) fn push_str(&self, s: &str) {
        use crossterm::event::{KeyCode, KeyModifiers};
        for c in s.chars() {
            self.push_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    pub(crate) fn resize(&self, rows: u16, cols: u16) {
        self.inner.borrow_mut().terminal.backend_mut().resize(cols, rows);
    }

    pub(crate) fn echoed(&self) -> Vec<String> {
        self.inner.borrow().echoed.clone()
    }

    pub(crate) fn pauses(&self) -> usize {
        self.inner.borrow().pauses
    }

    pub(crate) fn draws(&self) -> usize {
        self.inner.borrow().draws
    }

    pub(crate) fn is_released(&self) -> bool {
        self.inner.borrow().released
    }

    /// The last drawn frame, one string per row with trailing blanks trimmed.
    pub(crate) fn lines(&self) -> Vec<String> {
        let script = self.inner.borrow();
        let buf = script.terminal.backend().buffer();
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                let row: String = (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect();
                row.trim_end().to_string()
            })
            .collect()
    }
}

#[cfg(test)]
impl Frontend for ScriptedFrontend {
    fn size(&mut self) -> io::Result<(u16, u16)> {
        let script = self.inner.borrow();
        let area = script.terminal.backend().buffer().area;
        Ok((area.height, area.width))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> io::Result<()> {
        let mut script = self.inner.borrow_mut();
        script.draws += 1;
        script
            .terminal
            .draw(|f| ui::render(f, screen))
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.inner.borrow_mut().keys.pop_front() {
            Some(key) => Ok(Some(key)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "key script exhausted",
            )),
        }
    }

    fn release(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().released = true;
        Ok(())
    }

    fn reacquire(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().released = false;
        Ok(())
    }

    fn echo(&mut self, line: &str) -> io::Result<()> {
        self.inner.borrow_mut().echoed.push(line.to_string());
        Ok(())
    }

    fn pause(&mut self, _prompt: &str) -> io::Result<()> {
        self.inner.borrow_mut().pauses += 1;
        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.inner
            .borrow_mut()
            .terminal
            .clear()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}
