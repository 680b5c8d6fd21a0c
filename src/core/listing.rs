//! Directory listing for spy.
//!
//! A [DirectoryListing] is one sorted, filtered snapshot of a directory. It is rebuilt
//! wholesale on every navigation, refresh, ignore toggle or detail-mode change.

use crate::config::rules::IgnoreRules;
use crate::core::entry::{FileEntry, natural_cmp};
use crate::core::formatter::{SIZE_COLUMN_WIDTH, TIME_COLUMN_WIDTH, display_width};

use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Secondary sort key and extra display column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailMode {
    #[default]
    None,
    Size,
    Time,
}

impl DetailMode {
    /// Cycles none -> size -> time -> none.
    pub fn next(self) -> Self {
        match self {
            DetailMode::None => DetailMode::Size,
            DetailMode::Size => DetailMode::Time,
            DetailMode::Time => DetailMode::None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Some(DetailMode::None),
            "size" => Some(DetailMode::Size),
            "time" | "mtime" => Some(DetailMode::Time),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetailMode::None => "none",
            DetailMode::Size => "size",
            DetailMode::Time => "time",
        }
    }

    /// Columns added to each cell, including the separating space.
    pub fn extra_width(self) -> usize {
        match self {
            DetailMode::None => 0,
            DetailMode::Size => SIZE_COLUMN_WIDTH + 1,
            DetailMode::Time => TIME_COLUMN_WIDTH + 1,
        }
    }
}

/// Sorted and filtered entries of one directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    dir: PathBuf,
    entries: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Reads `dir`, drops ignored names and sorts.
    pub fn build(dir: &Path, ignores: &IgnoreRules, detail: DetailMode) -> io::Result<Self> {
        let mut entries = Vec::with_capacity(256);

        // read_dir never yields "." or ".."
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };

            let name = entry.file_name();
            if ignores.is_ignored(&name) {
                continue;
            }

            // file_type() trusts d_type and only falls back to lstat when it is unknown
            let ft = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            let mut flags = 0u8;
            if ft.is_dir() {
                flags |= FileEntry::IS_DIR;
            }
            if ft.is_symlink() {
                flags |= FileEntry::IS_SYMLINK;
                if fs::metadata(entry.path()).is_ok_and(|md| md.is_dir()) {
                    flags |= FileEntry::IS_DIR;
                }
            }

            entries.push(FileEntry::new(name, flags));
        }

        let mut listing = DirectoryListing {
            dir: dir.to_path_buf(),
            entries,
        };
        listing.sort(detail);
        Ok(listing)
    }

    /// Directories first; within each group by the detail key descending, then by name.
    pub fn sort(&mut self, detail: DetailMode) {
        let dir = &self.dir;
        self.entries.sort_by(|a, b| {
            match (a.is_dir(), b.is_dir()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
            let by_detail = match detail {
                DetailMode::None => Ordering::Equal,
                DetailMode::Size => b.attrs(dir).size().cmp(&a.attrs(dir).size()),
                DetailMode::Time => b.attrs(dir).modified().cmp(&a.attrs(dir).modified()),
            };
            by_detail.then_with(|| natural_cmp(&a.name_str(), &b.name_str()))
        });
    }

    // Accessors

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&FileEntry> {
        self.entries.get(idx)
    }

    pub fn position_of(&self, name: &OsStr) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    /// Widest name in terminal cells.
    pub fn max_name_width(&self) -> usize {
        self.entries
            .iter()
            .map(|e| display_width(&e.name_str()))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rng;
    use rand::seq::SliceRandom;
    use std::error;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn names(listing: &DirectoryListing) -> Vec<String> {
        listing
            .entries()
            .iter()
            .map(|e| e.name_str().into_owned())
            .collect()
    }

    #[test]
    fn build_sorts_dirs_first_then_natural() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        let mut files = vec!["b.txt", "10.txt", "2.txt", "file10", "file2", "Zeta"];
        files.shuffle(&mut rng());
        for name in &files {
            File::create(dir.path().join(name))?;
        }
        fs::create_dir(dir.path().join("A_dir"))?;
        fs::create_dir(dir.path().join("zz_dir"))?;

        let listing = DirectoryListing::build(dir.path(), &IgnoreRules::new(), DetailMode::None)?;
        assert_eq!(
            names(&listing),
            ["A_dir", "zz_dir", "10.txt", "2.txt", "b.txt", "file2", "file10", "Zeta"]
        );
        Ok(())
    }

    #[test]
    fn build_applies_ignore_rules() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        for name in ["main.c", "main.o", ".hidden"] {
            File::create(dir.path().join(name))?;
        }
        let mut ignores = IgnoreRules::new();
        ignores.add_pattern("*.o", "0")?;
        ignores.add_pattern(".*", "dot")?;

        let listing = DirectoryListing::build(dir.path(), &ignores, DetailMode::None)?;
        assert_eq!(names(&listing), ["main.c"]);

        ignores.toggle("dot");
        let listing = DirectoryListing::build(dir.path(), &ignores, DetailMode::None)?;
        assert_eq!(names(&listing), [".hidden", "main.c"]);
        Ok(())
    }

    #[test]
    fn size_detail_sorts_descending() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("small"), "x")?;
        fs::write(dir.path().join("large"), "x".repeat(100))?;
        fs::write(dir.path().join("medium"), "x".repeat(10))?;
        fs::write(dir.path().join("also_medium"), "y".repeat(10))?;
        fs::create_dir(dir.path().join("sub"))?;

        let listing = DirectoryListing::build(dir.path(), &IgnoreRules::new(), DetailMode::Size)?;
        assert_eq!(
            names(&listing),
            ["sub", "large", "also_medium", "medium", "small"]
        );
        Ok(())
    }

    #[test]
    fn time_detail_sorts_newest_first() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        let now = SystemTime::now();
        for (name, age) in [("old", 300u64), ("new", 10), ("mid", 100)] {
            let file = File::create(dir.path().join(name))?;
            file.set_modified(now - Duration::from_secs(age))?;
        }

        let listing = DirectoryListing::build(dir.path(), &IgnoreRules::new(), DetailMode::Time)?;
        assert_eq!(names(&listing), ["new", "mid", "old"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_counts_as_directory() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("real"))?;
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias"))?;
        File::create(dir.path().join("afile"))?;

        let listing = DirectoryListing::build(dir.path(), &IgnoreRules::new(), DetailMode::None)?;
        assert_eq!(names(&listing), ["alias", "real", "afile"]);
        let alias = listing.get(0).ok_or("missing alias")?;
        assert!(alias.is_dir() && alias.is_symlink());
        Ok(())
    }

    #[test]
    fn build_nonexistent_is_error() {
        let result = DirectoryListing::build(
            Path::new("/path/does/not/exist"),
            &IgnoreRules::new(),
            DetailMode::None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn detail_mode_cycles() {
        assert_eq!(DetailMode::None.next(), DetailMode::Size);
        assert_eq!(DetailMode::Size.next(), DetailMode::Time);
        assert_eq!(DetailMode::Time.next(), DetailMode::None);
        assert_eq!(DetailMode::parse(" SIZE "), Some(DetailMode::Size));
        assert_eq!(DetailMode::parse("bogus"), None);
    }
}
