//! Command handler methods for spy.
//!
//! This module implements the [Session] methods the command registry binds to keys. Every
//! handler turns failures into a status message; nothing here returns an error.

use crate::app::history::HistoryKind;
use crate::app::session::Session;
use crate::config::IgnoreRules;
use crate::core::listing::DetailMode;
use crate::core::proc::RunMode;
use crate::core::search::SearchEngine;

/// Session command handlers
impl Session {
    // Motion

    pub(crate) fn cmd_up(&mut self) {
        self.nav.move_up();
    }

    pub(crate) fn cmd_down(&mut self) {
        self.nav.move_down();
    }

    pub(crate) fn cmd_left(&mut self) {
        self.nav.move_left();
    }

    pub(crate) fn cmd_right(&mut self) {
        self.nav.move_right();
    }

    pub(crate) fn cmd_page_up(&mut self) {
        self.nav.page_up();
    }

    pub(crate) fn cmd_page_down(&mut self) {
        self.nav.page_down();
    }

    pub(crate) fn cmd_first(&mut self) {
        self.nav.first();
    }

    pub(crate) fn cmd_last(&mut self) {
        self.nav.last();
    }

    // Directories

    pub(crate) fn cmd_dir_up(&mut self) {
        if self.nav.go_parent() {
            self.sync_process_cwd();
        }
    }

    pub(crate) fn cmd_dir_down(&mut self) {
        if self.nav.enter_current() {
            self.sync_process_cwd();
        }
    }

    /// Directories are entered, files are opened in the editor.
    pub(crate) fn cmd_enter(&mut self) {
        self.open_current(self.env.editor_command());
    }

    /// Directories are entered, files are opened in the pager.
    pub(crate) fn cmd_display(&mut self) {
        self.open_current(self.env.pager_command());
    }

    fn open_current(&mut self, file_template: String) {
        let Some(is_dir) = self.nav.current_entry().map(|e| e.is_dir()) else {
            return;
        };
        if is_dir {
            self.cmd_dir_down();
        } else {
            self.execute_command(&file_template, RunMode::Silent);
        }
    }

    // Jump

    /// Asks for a target. An empty line goes back to the last target, or home.
    pub(crate) fn cmd_jump_prompt(&mut self) {
        let last = self
            .history
            .get(HistoryKind::Jump)
            .last()
            .unwrap_or("~")
            .to_string();
        let label = format!("Jump: ({last}) ");

        let Some(line) = self.prompt_line(&label, HistoryKind::Jump, |_, _| {}) else {
            return;
        };
        let target = if line.trim().is_empty() { last } else { line };
        self.history.push(HistoryKind::Jump, &target);
        self.cmd_jump(&target);
    }

    pub(crate) fn cmd_jump(&mut self, target: &str) {
        let home = self.env.home().map(|h| h.to_path_buf());
        if self.nav.change_dir(target, home.as_deref()) {
            self.sync_process_cwd();
        }
    }

    // Search

    /// Incremental search. The cursor follows the first match while typing and returns to
    /// where it was if the prompt is cancelled. An empty line repeats the previous pattern.
    pub(crate) fn cmd_search_prompt(&mut self) {
        let origin = self.nav.current();
        let line = self.prompt_line("/", HistoryKind::Search, |session, text| {
            session.preview_search(origin, text);
        });
        self.preview = None;
        self.nav.select(origin);

        let Some(line) = line else {
            return;
        };
        if line.is_empty() {
            let previous = self.search.pattern().to_string();
            self.cmd_search(&previous);
        } else {
            self.history.push(HistoryKind::Search, &line);
            self.cmd_search(&line);
        }
    }

    fn preview_search(&mut self, origin: usize, text: &str) {
        if text.is_empty() {
            self.preview = None;
            self.nav.select(origin);
            return;
        }
        let engine = SearchEngine::with_pattern(text);
        let found = engine.find_next(self.nav.listing().entries(), origin);
        self.nav.select(found.unwrap_or(origin));
        self.preview = Some(engine);
    }

    pub(crate) fn cmd_search(&mut self, pattern: &str) {
        if pattern.is_empty() {
            self.nav.set_status("No previous search");
            return;
        }
        self.search.set_pattern(pattern);
        self.cmd_search_next();
    }

    pub(crate) fn cmd_search_next(&mut self) {
        self.step_search(SearchEngine::find_next);
    }

    pub(crate) fn cmd_search_prev(&mut self) {
        self.step_search(SearchEngine::find_prev);
    }

    fn step_search(
        &mut self,
        find: fn(&SearchEngine, &[crate::core::FileEntry], usize) -> Option<usize>,
    ) {
        if !self.search.is_active() {
            self.nav.set_status("No previous search");
            return;
        }
        match find(&self.search, self.nav.listing().entries(), self.nav.current()) {
            Some(idx) => self.nav.select(idx),
            None => {
                let current_matches = self
                    .nav
                    .current_name()
                    .is_some_and(|name| self.search.is_match(&name));
                if !current_matches {
                    self.nav
                        .set_status(format!("Not found: {}", self.search.pattern()));
                }
            }
        }
    }

    // Shell commands

    pub(crate) fn cmd_execute_prompt(&mut self) {
        let Some(line) = self.prompt_line("!", HistoryKind::Command, |_, _| {}) else {
            return;
        };
        if line.trim().is_empty() {
            return;
        }
        self.history.push(HistoryKind::Command, &line);
        self.execute_command(&line, RunMode::Continue);
    }

    /// Runs a bound command and waits for a key afterwards.
    pub(crate) fn cmd_execute(&mut self, template: &str) {
        self.execute_command(template, RunMode::Continue);
    }

    pub(crate) fn cmd_interactive(&mut self, template: &str) {
        self.execute_command(template, RunMode::Interactive);
    }

    pub(crate) fn cmd_silent(&mut self, template: &str) {
        self.execute_command(template, RunMode::Silent);
    }

    // View

    pub(crate) fn cmd_detail_cycle(&mut self) {
        self.nav.cycle_detail();
    }

    pub(crate) fn cmd_detail(&mut self, mode: &str) {
        match DetailMode::parse(mode) {
            Some(detail) => self.nav.set_detail(detail),
            None => self
                .nav
                .set_status(format!("Unknown detail mode '{mode}' (none, size, time)")),
        }
    }

    pub(crate) fn cmd_toggle_ignore_default(&mut self) {
        self.cmd_toggle_ignore(IgnoreRules::DEFAULT_GROUP);
    }

    pub(crate) fn cmd_toggle_ignore(&mut self, label: &str) {
        match self.nav.toggle_ignore(label) {
            Some(true) => self.nav.set_status(format!("Ignoring '{label}'")),
            Some(false) => self.nav.set_status(format!("Showing '{label}'")),
            None => self.nav.set_status(format!("No ignore group '{label}'")),
        }
    }

    pub(crate) fn cmd_tag(&mut self) {
        self.nav.toggle_tag();
        self.nav.move_down();
    }

    pub(crate) fn cmd_refresh(&mut self) {
        self.reload();
    }

    pub(crate) fn cmd_redraw(&mut self) {
        if let Err(e) = self.frontend.invalidate() {
            self.fail(e);
        }
    }

    pub(crate) fn cmd_quit(&mut self) {
        self.quit = true;
    }
}
