//! Scoped line histories for the jump, search and execute prompts.
//!
//! Each [History] is an ordered, duplicate-free list: re-adding a line moves it to the end.
//! [HistoryManager] owns the three of them and their files under the home directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Jump,
    Search,
    Command,
}

impl HistoryKind {
    pub const ALL: [HistoryKind; 3] = [HistoryKind::Jump, HistoryKind::Search, HistoryKind::Command];

    /// File name under the home directory.
    pub fn file_name(self) -> &'static str {
        match self {
            HistoryKind::Jump => ".spy_jumps",
            HistoryKind::Search => ".spy_searches",
            HistoryKind::Command => ".spy_history",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    lines: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `line`, removing an earlier equal entry first. Blank lines are ignored.
    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.lines.retain(|l| l != line);
        self.lines.push(line.to_string());
    }

    // Accessors

    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    #[inline]
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Reads one entry per line, oldest first. A missing file is an empty history.
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e),
        };
        let mut history = Self::new();
        for line in content.lines() {
            history.push(line);
        }
        Ok(history)
    }

    /// Rewrites `path` with every entry, oldest first.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut file = io::BufWriter::new(fs::File::create(path)?);
        for line in &self.lines {
            writeln!(file, "{line}")?;
        }
        file.flush()
    }
}

/// The three prompt histories and where they live on disk.
#[derive(Debug, Default)]
pub struct HistoryManager {
    jump: History,
    search: History,
    command: History,
    dir: Option<PathBuf>,
    persist_search: bool,
}

impl HistoryManager {
    /// `dir` is where the history files live, normally the home directory. Without one nothing
    /// is loaded or saved.
    pub fn new(dir: Option<PathBuf>, persist_search: bool) -> Self {
        HistoryManager {
            dir,
            persist_search,
            ..Self::default()
        }
    }

    pub fn get(&self, kind: HistoryKind) -> &History {
        match kind {
            HistoryKind::Jump => &self.jump,
            HistoryKind::Search => &self.search,
            HistoryKind::Command => &self.command,
        }
    }

    pub fn get_mut(&mut self, kind: HistoryKind) -> &mut History {
        match kind {
            HistoryKind::Jump => &mut self.jump,
            HistoryKind::Search => &mut self.search,
            HistoryKind::Command => &mut self.command,
        }
    }

    pub fn push(&mut self, kind: HistoryKind, line: &str) {
        self.get_mut(kind).push(line);
    }

    fn is_persisted(&self, kind: HistoryKind) -> bool {
        kind != HistoryKind::Search || self.persist_search
    }

    fn path_for(&self, kind: HistoryKind) -> Option<PathBuf> {
        if !self.is_persisted(kind) {
            return None;
        }
        self.dir.as_ref().map(|d| d.join(kind.file_name()))
    }

    /// Loads every persisted history. Failures are logged and leave that history empty.
    pub fn load(&mut self) {
        for kind in HistoryKind::ALL {
            let Some(path) = self.path_for(kind) else {
                continue;
            };
            match History::load(&path) {
                Ok(history) => *self.get_mut(kind) = history,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "history load failed"),
            }
        }
    }

    /// Saves every persisted history. Failures are logged, never fatal.
    pub fn save(&self) {
        for kind in HistoryKind::ALL {
            let Some(path) = self.path_for(kind) else {
                continue;
            };
            if let Err(e) = self.get(kind).save(&path) {
                tracing::warn!(path = %path.display(), error = %e, "history save failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn readding_moves_to_end() {
        let mut h = History::new();
        h.push("a");
        h.push("b");
        h.push("a");
        assert_eq!(h.lines(), ["b", "a"]);
        h.push("   ");
        assert_eq!(h.len(), 2);
        assert_eq!(h.last(), Some("a"));
    }

    #[test]
    fn file_round_trip_dedups_on_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(".spy_jumps");
        fs::write(&path, "/tmp\n/usr\n/tmp\n\n")?;

        let mut h = History::load(&path)?;
        assert_eq!(h.lines(), ["/usr", "/tmp"]);
        h.push("/etc");
        h.save(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "/usr\n/tmp\n/etc\n");
        Ok(())
    }

    #[test]
    fn missing_file_is_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        assert!(History::load(&dir.path().join("nope"))?.is_empty());
        Ok(())
    }

    #[test]
    fn scopes_are_independent() {
        let mut m = HistoryManager::new(None, false);
        m.push(HistoryKind::Jump, "/tmp");
        m.push(HistoryKind::Command, "ls");
        assert_eq!(m.get(HistoryKind::Jump).lines(), ["/tmp"]);
        assert_eq!(m.get(HistoryKind::Command).lines(), ["ls"]);
        assert!(m.get(HistoryKind::Search).is_empty());
    }

    #[test]
    fn search_history_is_session_only_by_default() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut m = HistoryManager::new(Some(dir.path().to_path_buf()), false);
        m.push(HistoryKind::Jump, "/tmp");
        m.push(HistoryKind::Search, "foo");
        m.push(HistoryKind::Command, "make");
        m.save();

        assert!(dir.path().join(".spy_jumps").exists());
        assert!(dir.path().join(".spy_history").exists());
        assert!(!dir.path().join(".spy_searches").exists());

        let mut reloaded = HistoryManager::new(Some(dir.path().to_path_buf()), true);
        reloaded.load();
        assert_eq!(reloaded.get(HistoryKind::Command).lines(), ["make"]);
        assert!(reloaded.get(HistoryKind::Search).is_empty());

        reloaded.push(HistoryKind::Search, "bar");
        reloaded.save();
        assert_eq!(fs::read_to_string(dir.path().join(".spy_searches"))?, "bar\n");
        Ok(())
    }
}
