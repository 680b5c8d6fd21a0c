//! Session state and main controller module for spy.
//!
//! The [Session] owns everything that lives for the whole run:
//! - the [NavigationState] with the current directory, listing and cursor
//! - the key table, color rules and prompt histories built at startup
//! - the [ProcessRunner] used for every shell command
//! - the search engine and the [Frontend] that draws and reads keys
//!
//! One key is fully handled, child processes included, before the next is read. Signal flags
//! are only looked at between keys.

use crate::app::history::{HistoryKind, HistoryManager};
use crate::app::keymap::KeyBindingTable;
use crate::app::line_input::{EditEvent, LineEditor};
use crate::app::nav::NavigationState;
use crate::config::{ColorRules, Config, Environment};
use crate::core::layout::Viewport;
use crate::core::proc::{ProcessRunner, RunMode, expand_template};
use crate::core::search::SearchEngine;
use crate::core::signals;
use crate::core::terminal::Frontend;
use crate::ui::{BottomLine, Screen};
use crate::utils::shorten_home_path;

use crossterm::event::KeyEvent;
use std::io;
use std::path::Path;
use std::time::Duration;

/// How long one key read waits before the loop looks at the signal flags again.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Enumeration for each individual keypress result processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeypressResult {
    Consumed,
    Unbound,
    Quit,
}

/// A prompt being edited on the bottom line.
pub(super) struct Prompt {
    pub(super) label: String,
    pub(super) editor: LineEditor,
}

pub struct Session {
    pub(super) nav: NavigationState,
    pub(super) keymap: KeyBindingTable,
    pub(super) colors: ColorRules,
    pub(super) history: HistoryManager,
    pub(super) runner: ProcessRunner,
    pub(super) search: SearchEngine,
    /// Engine shown while a search prompt is open.
    pub(super) preview: Option<SearchEngine>,
    pub(super) env: Environment,
    pub(super) frontend: Box<dyn Frontend>,
    pub(super) prompt: Option<Prompt>,
    /// First terminal error seen inside a command, returned from the loop.
    pub(super) failure: Option<io::Error>,
    pub(super) follow_cwd: bool,
    pub(super) quit: bool,
}

impl Session {
    /// Opens `start` with the given config. Histories are loaded from the home directory.
    pub fn new(
        config: Config,
        env: Environment,
        start: &Path,
        mut frontend: Box<dyn Frontend>,
    ) -> io::Result<Self> {
        let (keymap, colors, ignores, settings) = config.into_parts();
        let (rows, cols) = frontend.size()?;
        let nav = NavigationState::open(start, ignores, Viewport::for_terminal(rows, cols))?;

        let mut history =
            HistoryManager::new(env.home().map(Path::to_path_buf), settings.search_history);
        history.load();

        let runner = ProcessRunner::new(env.shell(), settings.cwd_recovery);
        tracing::info!(
            dir = %nav.cwd().display(),
            shell = %runner.shell().display(),
            cwd_recovery = runner.recovers_cwd(),
            "session started"
        );

        Ok(Session {
            nav,
            keymap,
            colors,
            history,
            runner,
            search: SearchEngine::new(),
            preview: None,
            env,
            frontend,
            prompt: None,
            failure: None,
            follow_cwd: false,
            quit: false,
        })
    }

    /// Keeps the process working directory on the browsed directory.
    pub fn follow_process_cwd(mut self) -> Self {
        self.follow_cwd = true;
        self.sync_process_cwd();
        self
    }

    // Accessors

    #[inline]
    pub fn nav(&self) -> &NavigationState {
        &self.nav
    }

    #[inline]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    #[inline]
    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    #[inline]
    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    /// Runs until `quit` or a shutdown signal.
    pub fn run(&mut self) -> io::Result<()> {
        self.apply_resize()?;
        while !self.quit {
            if signals::take_shutdown() {
                tracing::info!("shutdown requested");
                break;
            }
            if signals::take_resize() {
                self.apply_resize()?;
            }
            self.draw()?;

            let Some(key) = self.frontend.poll_key(POLL_INTERVAL)? else {
                continue;
            };
            self.nav.clear_status();
            self.handle_key(key);
            if let Some(e) = self.failure.take() {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Writes the persisted histories.
    pub fn finish(&self) {
        self.history.save();
    }

    /// Resolves and runs the binding for `key`.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> KeypressResult {
        let Some(command) = self.keymap.lookup(key).cloned() else {
            tracing::trace!(?key, "unbound key");
            return KeypressResult::Unbound;
        };
        tracing::debug!(?command, "dispatch");
        command.execute(self);
        if self.quit {
            KeypressResult::Quit
        } else {
            KeypressResult::Consumed
        }
    }

    pub(super) fn draw(&mut self) -> io::Result<()> {
        let cwd = shorten_home_path(self.nav.cwd(), self.env.home());
        let bottom = match &self.prompt {
            Some(prompt) => BottomLine::Prompt {
                prompt: &prompt.label,
                text: prompt.editor.text(),
                cursor: prompt.editor.cursor_width(),
            },
            None => self.nav.status().map_or(BottomLine::Empty, BottomLine::Status),
        };
        let screen = Screen {
            title: self.env.title(),
            cwd: &cwd,
            nav: &self.nav,
            colors: &self.colors,
            search: self.preview.as_ref().unwrap_or(&self.search),
            bottom,
        };
        self.frontend.draw(&screen)
    }

    pub(super) fn apply_resize(&mut self) -> io::Result<()> {
        let (rows, cols) = self.frontend.size()?;
        self.nav.set_viewport(Viewport::for_terminal(rows, cols));
        Ok(())
    }

    /// Records a terminal failure inside a command; the loop stops after the current key.
    pub(super) fn fail(&mut self, e: io::Error) {
        tracing::error!(error = %e, "terminal failure");
        self.quit = true;
        if self.failure.is_none() {
            self.failure = Some(e);
        }
    }

    /// Collects a line on the bottom line.
    ///
    /// `on_edit` runs after every change to the text, for live previews. Returns `None` when
    /// the prompt is cancelled.
    pub(super) fn prompt_line(
        &mut self,
        label: &str,
        kind: HistoryKind,
        mut on_edit: impl FnMut(&mut Session, &str),
    ) -> Option<String> {
        self.prompt = Some(Prompt {
            label: label.to_string(),
            editor: LineEditor::new(),
        });

        let line = loop {
            if signals::take_shutdown() {
                self.quit = true;
                break None;
            }
            if signals::take_resize()
                && let Err(e) = self.apply_resize()
            {
                self.fail(e);
                break None;
            }
            if let Err(e) = self.draw() {
                self.fail(e);
                break None;
            }

            let key = match self.frontend.poll_key(POLL_INTERVAL) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(e) => {
                    self.fail(e);
                    break None;
                }
            };

            let Some(prompt) = self.prompt.as_mut() else {
                break None;
            };
            match prompt.editor.apply(key, self.history.get(kind)) {
                EditEvent::Confirm => break Some(prompt.editor.text().to_string()),
                EditEvent::Cancel => break None,
                EditEvent::Edited => {
                    let text = prompt.editor.text().to_string();
                    on_edit(self, &text);
                }
                EditEvent::Moved | EditEvent::Ignored => {}
            }
        };

        self.prompt = None;
        line
    }

    /// Expands `template` against the entry under the cursor and runs it.
    ///
    /// The outcome goes to the status line. A directory reported back by the child's shell
    /// becomes the new current directory, and the listing is reread either way.
    pub(super) fn execute_command(&mut self, template: &str, mode: RunMode) {
        let name = self.nav.current_name().unwrap_or_default();
        let home = self.env.home().unwrap_or(Path::new("~"));
        let command = expand_template(template, &name, home);
        if command.trim().is_empty() {
            self.nav.set_status("No command given");
            return;
        }

        let cwd = self.nav.cwd().to_path_buf();
        match self
            .runner
            .run(&command, mode, &cwd, self.frontend.as_mut())
        {
            Ok(outcome) => {
                if !outcome.report.is_success() {
                    self.nav.set_status(format!("{command}: {}", outcome.report));
                }
                if let Some(dir) = outcome.new_cwd
                    && self.nav.change_to(&dir)
                {
                    self.sync_process_cwd();
                }
            }
            Err(e) => {
                tracing::warn!(command, error = %e, "command failed");
                self.nav.set_status(e.to_string());
            }
        }
        self.reload();
    }

    /// Rereads the listing, keeping the cursor on the same name.
    pub(super) fn reload(&mut self) {
        if let Err(e) = self.nav.refresh() {
            self.nav
                .set_status(format!("{}: {e}", self.nav.cwd().display()));
        }
    }

    /// Mirrors the browsed directory into the process working directory.
    pub(super) fn sync_process_cwd(&mut self) {
        if !self.follow_cwd {
            return;
        }
        if let Err(e) = std::env::set_current_dir(self.nav.cwd()) {
            tracing::warn!(dir = %self.nav.cwd().display(), error = %e, "set_current_dir failed");
        }
    }
}
