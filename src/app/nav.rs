//! Navigation state for spy.
//!
//! Owns the current directory, its listing, the cursor and everything that survives a
//! directory change: remembered selections, tags and the pending status message.
//!
//! The cursor is kept both as a listing index and as a [GridPos]; every mutation goes through
//! [NavigationState::select] or the grid moves, which keep the two in step.

use crate::config::rules::IgnoreRules;
use crate::core::entry::FileEntry;
use crate::core::layout::{GridLayout, GridPos, Viewport};
use crate::core::listing::{DetailMode, DirectoryListing};
use crate::utils::expand_words;

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Cells taken by the directory marker and the space before the name.
pub const MARKER_WIDTH: usize = 2;

pub struct NavigationState {
    cwd: PathBuf,
    listing: DirectoryListing,
    ignores: IgnoreRules,
    detail: DetailMode,
    viewport: Viewport,
    layout: GridLayout,
    current: usize,
    pos: GridPos,
    remembered: HashMap<PathBuf, OsString>,
    tagged: HashSet<PathBuf>,
    status: Option<String>,
}

impl NavigationState {
    /// Opens `dir`. Fails when it cannot be resolved or read.
    pub fn open(dir: &Path, ignores: IgnoreRules, viewport: Viewport) -> io::Result<Self> {
        let cwd = fs::canonicalize(dir)?;
        let listing = DirectoryListing::build(&cwd, &ignores, DetailMode::None)?;
        let mut nav = NavigationState {
            cwd,
            listing,
            ignores,
            detail: DetailMode::None,
            viewport,
            layout: GridLayout::default(),
            current: 0,
            pos: GridPos::default(),
            remembered: HashMap::new(),
            tagged: HashSet::new(),
            status: None,
        };
        nav.relayout();
        Ok(nav)
    }

    // Accessors

    #[inline]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[inline]
    pub fn listing(&self) -> &DirectoryListing {
        &self.listing
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[inline]
    pub fn detail(&self) -> DetailMode {
        self.detail
    }

    #[inline]
    pub fn ignores(&self) -> &IgnoreRules {
        &self.ignores
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn pos(&self) -> GridPos {
        self.pos
    }

    #[inline]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn current_entry(&self) -> Option<&FileEntry> {
        self.listing.get(self.current)
    }

    /// Name of the entry under the cursor, lossily converted for command templates.
    pub fn current_name(&self) -> Option<String> {
        self.current_entry().map(|e| e.name_str().into_owned())
    }

    pub fn is_tagged(&self, entry: &FileEntry) -> bool {
        !self.tagged.is_empty() && self.tagged.contains(&self.cwd.join(entry.name()))
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    // Cursor

    /// Moves the cursor to `idx`, clamped to the listing.
    pub fn select(&mut self, idx: usize) {
        self.current = idx.min(self.listing.len().saturating_sub(1));
        self.pos = self.layout.index_to_pos(self.current);
    }

    fn select_pos(&mut self, pos: GridPos) {
        self.pos = pos;
        self.current = self.layout.pos_to_index(pos);
    }

    pub fn move_up(&mut self) {
        if self.listing.is_empty() {
            return;
        }
        let mut pos = self.pos;
        pos.row = match pos.row {
            0 => self.layout.rows_at(pos.page, pos.col).saturating_sub(1),
            row => row - 1,
        };
        self.select_pos(pos);
    }

    pub fn move_down(&mut self) {
        if self.listing.is_empty() {
            return;
        }
        let mut pos = self.pos;
        pos.row += 1;
        if pos.row >= self.layout.rows_at(pos.page, pos.col) {
            pos.row = 0;
        }
        self.select_pos(pos);
    }

    pub fn move_left(&mut self) {
        if self.listing.is_empty() {
            return;
        }
        let mut pos = self.pos;
        pos.col = match pos.col {
            0 => self.layout.cols_at(pos.page, pos.row).saturating_sub(1),
            col => col - 1,
        };
        self.select_pos(pos);
    }

    pub fn move_right(&mut self) {
        if self.listing.is_empty() {
            return;
        }
        let mut pos = self.pos;
        pos.col += 1;
        if pos.col >= self.layout.cols_at(pos.page, pos.row) {
            pos.col = 0;
        }
        self.select_pos(pos);
    }

    pub fn page_up(&mut self) {
        if self.pos.page > 0 {
            self.select(self.current - self.layout.page_size());
        }
    }

    /// Next page, same cell. Lands on the last entry when that cell is empty.
    pub fn page_down(&mut self) {
        if self.pos.page + 1 < self.layout.pages() {
            self.select(self.current + self.layout.page_size());
        }
    }

    pub fn first(&mut self) {
        self.select(0);
    }

    pub fn last(&mut self) {
        self.select(self.listing.len().saturating_sub(1));
    }

    // Geometry

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.relayout();
    }

    /// Widest cell: marker, name and detail column.
    pub fn entry_width(&self) -> usize {
        self.listing.max_name_width() + MARKER_WIDTH + self.detail.extra_width()
    }

    fn relayout(&mut self) {
        self.layout = GridLayout::compute(self.listing.len(), self.viewport, self.entry_width());
        self.select(self.current);
    }

    // Listing

    /// Rebuilds the listing in place, keeping the cursor on the same name when it still exists
    /// and clamping it otherwise.
    pub fn refresh(&mut self) -> io::Result<()> {
        let selected = self.current_entry().map(|e| e.name().to_os_string());
        let listing = DirectoryListing::build(&self.cwd, &self.ignores, self.detail)?;
        self.listing = listing;
        self.relayout();
        if let Some(idx) = selected.and_then(|name| self.listing.position_of(&name)) {
            self.select(idx);
        }
        Ok(())
    }

    fn refresh_or_report(&mut self) {
        if let Err(e) = self.refresh() {
            self.set_status(format!("{}: {}", self.cwd.display(), e));
        }
    }

    pub fn set_detail(&mut self, detail: DetailMode) {
        self.detail = detail;
        self.refresh_or_report();
    }

    pub fn cycle_detail(&mut self) {
        self.set_detail(self.detail.next());
    }

    /// Flips an ignore group and rebuilds. Returns the new state, `None` for an unknown label.
    pub fn toggle_ignore(&mut self, label: &str) -> Option<bool> {
        let enabled = self.ignores.toggle(label)?;
        self.refresh_or_report();
        Some(enabled)
    }

    /// Tags or untags the entry under the cursor.
    pub fn toggle_tag(&mut self) {
        let Some(entry) = self.current_entry() else {
            return;
        };
        let path = self.cwd.join(entry.name());
        if !self.tagged.remove(&path) {
            self.tagged.insert(path);
        }
    }

    // Directory changes

    /// Runs the directory-change protocol for a user supplied target.
    ///
    /// `target` is word-expanded and resolved against the current directory. On failure the
    /// status message carries the error and nothing else changes. Returns whether the
    /// directory actually changed.
    pub fn change_dir(&mut self, target: &str, home: Option<&Path>) -> bool {
        let expanded = expand_words(target, home);
        if expanded.is_empty() {
            return false;
        }
        let path = self.cwd.join(&expanded);
        match self.try_change_dir(&path) {
            Ok(changed) => changed,
            Err(e) => {
                self.set_status(format!("{expanded}: {e}"));
                false
            }
        }
    }

    /// Descends into the entry under the cursor.
    pub fn enter_current(&mut self) -> bool {
        let Some(name) = self.current_entry().map(|e| e.name().to_os_string()) else {
            return false;
        };
        let path = self.cwd.join(&name);
        match self.try_change_dir(&path) {
            Ok(changed) => changed,
            Err(e) => {
                self.set_status(format!("{}: {e}", name.to_string_lossy()));
                false
            }
        }
    }

    pub fn go_parent(&mut self) -> bool {
        let Some(parent) = self.cwd.parent().map(Path::to_path_buf) else {
            return false;
        };
        match self.try_change_dir(&parent) {
            Ok(changed) => changed,
            Err(e) => {
                self.set_status(format!("..: {e}"));
                false
            }
        }
    }

    /// Changes to an already resolved path, such as one reported back by a child shell.
    pub fn change_to(&mut self, path: &Path) -> bool {
        match self.try_change_dir(path) {
            Ok(changed) => changed,
            Err(e) => {
                self.set_status(format!("{}: {e}", path.display()));
                false
            }
        }
    }

    fn try_change_dir(&mut self, path: &Path) -> io::Result<bool> {
        let resolved = fs::canonicalize(path)?;
        if !resolved.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotADirectory, "Not a directory"));
        }
        if resolved == self.cwd {
            return Ok(false);
        }

        let listing = DirectoryListing::build(&resolved, &self.ignores, self.detail)?;
        tracing::debug!(from = %self.cwd.display(), to = %resolved.display(), "chdir");

        if let Some(name) = self.current_entry().map(|e| e.name().to_os_string()) {
            self.remembered.insert(self.cwd.clone(), name);
        }

        let old = std::mem::replace(&mut self.cwd, resolved);
        self.listing = listing;
        self.current = 0;
        self.relayout();

        let focus = if old.parent() == Some(self.cwd.as_path()) {
            old.file_name().map(|n| n.to_os_string())
        } else {
            self.remembered.get(&self.cwd).cloned()
        };
        let idx = focus
            .and_then(|name| self.listing.position_of(&name))
            .unwrap_or(0);
        self.select(idx);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::{TempDir, tempdir};

    fn names(nav: &NavigationState) -> Vec<String> {
        nav.listing()
            .entries()
            .iter()
            .map(|e| e.name_str().into_owned())
            .collect()
    }

    fn selected(nav: &NavigationState) -> String {
        nav.current_name().unwrap_or_default()
    }

    /// Files f00..f{n-1}, names all the same width.
    fn flat_dir(n: usize) -> Result<TempDir, Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        for i in 0..n {
            File::create(dir.path().join(format!("f{i:02}")))?;
        }
        Ok(dir)
    }

    /// Viewport with `rows` rows and room for exactly `cols` columns of 3-wide names.
    fn grid(rows: usize, cols: usize) -> Viewport {
        // name width 3 + marker 2 + padding 1
        Viewport {
            rows,
            cols: cols * 6,
        }
    }

    #[test]
    fn partial_page_wraps_at_short_column() -> Result<(), Box<dyn std::error::Error>> {
        // 3 rows x 2 cols, 8 entries: page 1 holds f06 and f07 in one column
        let dir = flat_dir(8)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(3, 2))?;
        assert_eq!(nav.layout().pages(), 2);

        nav.select(6);
        nav.move_down();
        assert_eq!(selected(&nav), "f07");
        nav.move_down();
        assert_eq!(selected(&nav), "f06");
        nav.move_up();
        assert_eq!(selected(&nav), "f07");

        nav.move_right();
        assert_eq!(selected(&nav), "f07");
        nav.move_left();
        assert_eq!(selected(&nav), "f07");
        Ok(())
    }

    #[test]
    fn full_page_wraps_rows_and_cols() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(8)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(3, 2))?;

        nav.move_up();
        assert_eq!(selected(&nav), "f02");
        nav.move_right();
        assert_eq!(selected(&nav), "f05");
        nav.move_right();
        assert_eq!(selected(&nav), "f02");
        nav.move_left();
        assert_eq!(selected(&nav), "f05");
        Ok(())
    }

    #[test]
    fn paging_clamps_on_last_page() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(8)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(3, 2))?;

        nav.select(4);
        nav.page_down();
        assert_eq!(selected(&nav), "f07");
        assert_eq!(nav.pos().page, 1);
        nav.page_down();
        assert_eq!(selected(&nav), "f07");

        nav.page_up();
        assert_eq!(selected(&nav), "f01");
        nav.page_up();
        assert_eq!(selected(&nav), "f01");

        nav.last();
        assert_eq!(nav.current(), 7);
        nav.first();
        assert_eq!(nav.current(), 0);
        Ok(())
    }

    #[test]
    fn empty_directory_moves_are_noops() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(3, 2))?;
        nav.move_up();
        nav.move_down();
        nav.move_left();
        nav.move_right();
        nav.page_down();
        nav.last();
        assert_eq!(nav.current(), 0);
        assert!(nav.current_entry().is_none());
        Ok(())
    }

    #[test]
    fn parent_selects_departed_directory() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        for name in ["a", "m", "y", "z"] {
            fs::create_dir(root.path().join(name))?;
        }
        let mut nav = NavigationState::open(&root.path().join("y"), IgnoreRules::new(), grid(5, 4))?;

        assert!(nav.change_dir("..", None));
        assert_eq!(nav.cwd(), fs::canonicalize(root.path())?);
        assert_eq!(selected(&nav), "y");

        assert!(nav.enter_current());
        assert!(nav.go_parent());
        assert_eq!(selected(&nav), "y");
        Ok(())
    }

    #[test]
    fn jump_to_parent_path_selects_departed_directory() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        fs::create_dir(root.path().join("a"))?;
        fs::create_dir(root.path().join("b"))?;
        let mut nav = NavigationState::open(&root.path().join("b"), IgnoreRules::new(), grid(5, 4))?;

        let parent = root.path().to_string_lossy().into_owned();
        assert!(nav.change_dir(&parent, None));
        assert_eq!(selected(&nav), "b");
        Ok(())
    }

    #[test]
    fn selection_is_remembered_per_directory() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let sub = root.path().join("sub");
        let other = root.path().join("other");
        fs::create_dir(&sub)?;
        fs::create_dir(&other)?;
        for name in ["one", "two", "three"] {
            File::create(sub.join(name))?;
        }

        let mut nav = NavigationState::open(&sub, IgnoreRules::new(), grid(5, 4))?;
        nav.last();
        let chosen = selected(&nav);

        assert!(nav.change_dir(&other.to_string_lossy(), None));
        assert!(nav.change_dir(&sub.to_string_lossy(), None));
        assert_eq!(selected(&nav), chosen);
        Ok(())
    }

    #[test]
    fn failed_change_keeps_state() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(3)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(5, 4))?;
        nav.select(2);
        let before = nav.cwd().to_path_buf();

        assert!(!nav.change_dir("does-not-exist", None));
        assert_eq!(nav.cwd(), before);
        assert_eq!(nav.current(), 2);
        assert!(nav.status().is_some_and(|s| s.starts_with("does-not-exist: ")));

        nav.clear_status();
        assert!(!nav.change_dir("f00", None));
        assert!(nav.status().is_some());
        assert_eq!(names(&nav), ["f00", "f01", "f02"]);
        Ok(())
    }

    #[test]
    fn same_directory_is_not_a_change() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(3)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(5, 4))?;
        nav.select(1);
        assert!(!nav.change_dir(".", None));
        assert_eq!(nav.current(), 1);
        assert!(nav.status().is_none());
        Ok(())
    }

    #[test]
    fn tilde_target_goes_home() -> Result<(), Box<dyn std::error::Error>> {
        let home = tempdir()?;
        let start = tempdir()?;
        let mut nav = NavigationState::open(start.path(), IgnoreRules::new(), grid(5, 4))?;
        assert!(nav.change_dir("~", Some(home.path())));
        assert_eq!(nav.cwd(), fs::canonicalize(home.path())?);
        Ok(())
    }

    #[test]
    fn detail_toggle_keeps_selection() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("big"), "x".repeat(50))?;
        fs::write(dir.path().join("a_small"), "x")?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(5, 80))?;
        assert_eq!(names(&nav), ["a_small", "big"]);

        nav.select(0);
        nav.set_detail(DetailMode::Size);
        assert_eq!(names(&nav), ["big", "a_small"]);
        assert_eq!(selected(&nav), "a_small");
        Ok(())
    }

    #[test]
    fn refresh_clamps_when_selection_vanishes() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(3)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(5, 4))?;
        nav.last();
        fs::remove_file(dir.path().join("f02"))?;
        nav.refresh()?;
        assert_eq!(selected(&nav), "f01");
        Ok(())
    }

    #[test]
    fn ignore_toggle_rebuilds() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        File::create(dir.path().join(".hidden"))?;
        File::create(dir.path().join("shown"))?;
        let mut ignores = IgnoreRules::new();
        ignores.add_pattern(".*", "dot")?;

        let mut nav = NavigationState::open(dir.path(), ignores, grid(5, 4))?;
        assert_eq!(names(&nav), ["shown"]);
        assert_eq!(nav.toggle_ignore("dot"), Some(false));
        assert_eq!(names(&nav), [".hidden", "shown"]);
        assert_eq!(nav.toggle_ignore("nope"), None);
        Ok(())
    }

    #[test]
    fn tags_follow_paths() -> Result<(), Box<dyn std::error::Error>> {
        let dir = flat_dir(2)?;
        let mut nav = NavigationState::open(dir.path(), IgnoreRules::new(), grid(5, 4))?;
        nav.toggle_tag();
        let entries = nav.listing().entries();
        assert!(nav.is_tagged(&entries[0]));
        assert!(!nav.is_tagged(&entries[1]));
        nav.toggle_tag();
        assert!(!nav.is_tagged(&nav.listing().entries()[0]));
        Ok(())
    }
}
