//! Directory entry model for spy.
//!
//! Provides the [FileEntry] struct which is used throughout spy.
//! Entries are created by [crate::core::listing::DirectoryListing::build] and carry only the
//! name and the directory/symlink classification. Everything else ([EntryAttrs]) is fetched
//! lazily with a single non-following stat call and cached for the lifetime of the listing.

use std::cell::OnceCell;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::fs::symlink_metadata;
use std::path::Path;
use std::time::SystemTime;

/// Attributes fetched from one `lstat` of an entry.
///
/// Symbolic links are not followed, so the size and mode of a link entry describe the link
/// itself and not its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryAttrs {
    size: u64,
    modified: SystemTime,
    mode: u32,
    is_dir: bool,
}

impl Default for EntryAttrs {
    fn default() -> Self {
        EntryAttrs {
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            mode: 0,
            is_dir: false,
        }
    }
}

impl EntryAttrs {
    const EXEC_BITS: u32 = 0o111;
    const OWNER_WRITE: u32 = 0o200;

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    #[inline]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Any execute bit set on something that is not a directory.
    pub fn is_executable(&self) -> bool {
        !self.is_dir && self.mode & Self::EXEC_BITS != 0
    }

    pub fn is_read_only(&self) -> bool {
        self.mode != 0 && self.mode & Self::OWNER_WRITE == 0
    }

    fn fetch(path: &Path) -> Self {
        let Ok(md) = symlink_metadata(path) else {
            return Self::default();
        };

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            md.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = if md.permissions().readonly() { 0o444 } else { 0o644 };

        EntryAttrs {
            size: md.len(),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            mode,
            is_dir: md.is_dir(),
        }
    }
}

/// Represents a single entry in a directory listing.
#[derive(Debug, Clone)]
pub struct FileEntry {
    name: Box<OsStr>,
    flags: u8,
    attrs: OnceCell<EntryAttrs>,
}

impl FileEntry {
    // Flag bit definitions
    pub const IS_DIR: u8 = 1 << 0;
    pub const IS_SYMLINK: u8 = 1 << 1;

    pub fn new(name: OsString, flags: u8) -> Self {
        FileEntry {
            name: name.into_boxed_os_str(),
            flags,
            attrs: OnceCell::new(),
        }
    }

    // Accessors

    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    #[inline]
    pub fn name_str(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.flags & Self::IS_DIR != 0
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.flags & Self::IS_SYMLINK != 0
    }

    /// Returns the cached attributes, running the stat call on first access.
    /// `dir` is the directory the entry was listed from.
    pub fn attrs(&self, dir: &Path) -> &EntryAttrs {
        self.attrs.get_or_init(|| EntryAttrs::fetch(&dir.join(self.name())))
    }

    #[inline]
    pub fn has_cached_attrs(&self) -> bool {
        self.attrs.get().is_some()
    }
}

/// Compares two names the way the listing orders them.
///
/// Case-insensitive. The first character compares by lowercase code point; after that every
/// run of ASCII digits is read as one number. Equal keys fall back to the raw bytes so the
/// order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ab, bb) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);

    while i < ab.len() && j < bb.len() {
        if i > 0 && j > 0 && ab[i].is_ascii_digit() && bb[j].is_ascii_digit() {
            let a_end = digit_run_end(ab, i);
            let b_end = digit_run_end(bb, j);
            let ord = cmp_digit_runs(&a[i..a_end], &b[j..b_end]);
            if ord != Ordering::Equal {
                return ord;
            }
            i = a_end;
            j = b_end;
            continue;
        }

        // Both indices sit on char boundaries: digit runs are ASCII and everything else
        // advances by whole chars.
        let (Some(ca), Some(cb)) = (a[i..].chars().next(), b[j..].chars().next()) else {
            break;
        };
        let ord = lower(ca).cmp(&lower(cb));
        if ord != Ordering::Equal {
            return ord;
        }
        i += ca.len_utf8();
        j += cb.len_utf8();
    }

    let rest = (ab.len() - i).cmp(&(bb.len() - j));
    if rest != Ordering::Equal {
        return rest;
    }
    ab.cmp(bb)
}

#[inline]
fn lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn digit_run_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .map_or(bytes.len(), |off| start + off)
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn file_entry_flags() -> Result<(), Box<dyn std::error::Error>> {
        let fe_file = FileEntry::new(OsString::from("file.txt"), 0);
        assert!(!fe_file.is_dir());
        assert_eq!(fe_file.name_str(), "file.txt");

        let flags = FileEntry::IS_DIR | FileEntry::IS_SYMLINK;
        let fe_dir = FileEntry::new(OsString::from("linked"), flags);
        assert!(fe_dir.is_dir());
        assert!(fe_dir.is_symlink());
        Ok(())
    }

    #[test]
    fn attrs_are_fetched_once() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("hello.txt");
        let mut file = File::create(&path)?;
        writeln!(file, "abc123")?;

        let entry = FileEntry::new(OsString::from("hello.txt"), 0);
        assert!(!entry.has_cached_attrs());
        let size = entry.attrs(tmp.path()).size();
        assert_eq!(size, 7);
        assert!(entry.has_cached_attrs());

        // Growing the file afterwards must not change the cached value.
        writeln!(file, "more bytes")?;
        file.sync_all()?;
        assert_eq!(entry.attrs(tmp.path()).size(), 7);
        Ok(())
    }

    #[test]
    fn attrs_of_missing_file_are_zeroed() {
        let entry = FileEntry::new(OsString::from("gone"), 0);
        let attrs = entry.attrs(Path::new("/path/does/not/exist"));
        assert_eq!(attrs, &EntryAttrs::default());
        assert!(!attrs.is_executable());
        assert!(!attrs.is_read_only());
    }

    #[cfg(unix)]
    #[test]
    fn attrs_do_not_follow_symlinks() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        const S_IFMT: u32 = 0o170000;
        const S_IFLNK: u32 = 0o120000;

        let tmp = TempDir::new()?;
        let target = tmp.path().join("notes.txt");
        fs::write(&target, "plain text")?;
        fs::set_permissions(&target, fs::Permissions::from_mode(0o644))?;
        std::os::unix::fs::symlink(&target, tmp.path().join("link"))?;

        let notes = FileEntry::new(OsString::from("notes.txt"), 0);
        assert!(!notes.attrs(tmp.path()).is_executable());

        let link = FileEntry::new(OsString::from("link"), FileEntry::IS_SYMLINK);
        let link_attrs = link.attrs(tmp.path());
        assert_eq!(link_attrs.mode() & S_IFMT, S_IFLNK);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn read_only_detection() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new()?;
        let path = tmp.path().join("locked.txt");
        fs::write(&path, "x")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444))?;

        let entry = FileEntry::new(OsString::from("locked.txt"), 0);
        assert!(entry.attrs(tmp.path()).is_read_only());
        assert!(!entry.attrs(tmp.path()).is_executable());
        Ok(())
    }

    #[test]
    fn natural_order_numbers() {
        let mut names = vec!["file2", "file10", "file1"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["file1", "file2", "file10"]);
    }

    #[test]
    fn natural_order_case_insensitive() {
        let mut names = vec!["B", "a"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["a", "B"]);
    }

    #[test]
    fn leading_digits_compare_by_code_point() {
        let mut names = vec!["b.txt", "2.txt", "10.txt"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["10.txt", "2.txt", "b.txt"]);
    }

    #[test]
    fn natural_order_is_total() {
        assert_eq!(natural_cmp("a", "A"), "a".cmp("A"));
        assert_eq!(natural_cmp("x01", "x1"), "x01".cmp("x1"));
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
        assert_eq!(
            natural_cmp("v99999999999999999999999", "v100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn natural_order_handles_multibyte() {
        assert_eq!(natural_cmp("é1", "É2"), Ordering::Less);
        assert_eq!(natural_cmp("ä", "b"), 'ä'.cmp(&'b'));
    }
}
