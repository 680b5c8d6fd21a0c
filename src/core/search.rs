//! Incremental regex search over the current listing.
//!
//! Holds at most one compiled, case-insensitive pattern. A pattern that fails to compile is
//! kept as text but matches nothing.

use crate::core::entry::FileEntry;

use regex::{Regex, RegexBuilder};
use std::ops::Range;

#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    source: String,
    regex: Option<Regex>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with `pattern` already compiled.
    pub fn with_pattern(pattern: &str) -> Self {
        let mut engine = Self::new();
        engine.set_pattern(pattern);
        engine
    }

    /// Replaces the pattern. Returns whether it compiled.
    pub fn set_pattern(&mut self, pattern: &str) -> bool {
        self.source = pattern.to_string();
        self.regex = if pattern.is_empty() {
            None
        } else {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()
        };
        self.regex.is_some()
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.regex = None;
    }

    // Accessors

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.source.is_empty()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Byte span of the first match in `name`.
    pub fn highlight(&self, name: &str) -> Option<Range<usize>> {
        let m = self.regex.as_ref()?.find(name)?;
        (!m.range().is_empty()).then(|| m.range())
    }

    /// First match after `current`, wrapping. Never returns `current` itself.
    pub fn find_next(&self, entries: &[FileEntry], current: usize) -> Option<usize> {
        let len = entries.len();
        if self.regex.is_none() || len < 2 {
            return None;
        }
        (1..len)
            .map(|step| (current + step) % len)
            .find(|&idx| self.is_match(&entries[idx].name_str()))
    }

    /// First match before `current`, wrapping. Never returns `current` itself.
    pub fn find_prev(&self, entries: &[FileEntry], current: usize) -> Option<usize> {
        let len = entries.len();
        if self.regex.is_none() || len < 2 {
            return None;
        }
        (1..len)
            .map(|step| (current + len - step) % len)
            .find(|&idx| self.is_match(&entries[idx].name_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn entries(names: &[&str]) -> Vec<FileEntry> {
        names
            .iter()
            .map(|n| FileEntry::new(OsString::from(n), 0))
            .collect()
    }

    #[test]
    fn case_insensitive_by_default() {
        let engine = SearchEngine::with_pattern("readme");
        assert!(engine.is_match("README.md"));
        assert!(!engine.is_match("main.rs"));
    }

    #[test]
    fn next_wraps_and_skips_current() {
        let list = entries(&["a.rs", "b.txt", "c.rs", "d.txt"]);
        let engine = SearchEngine::with_pattern(r"\.rs$");
        assert_eq!(engine.find_next(&list, 0), Some(2));
        assert_eq!(engine.find_next(&list, 2), Some(0));
        assert_eq!(engine.find_next(&list, 3), Some(0));
        assert_eq!(engine.find_prev(&list, 0), Some(2));
        assert_eq!(engine.find_prev(&list, 2), Some(0));
        assert_eq!(engine.find_prev(&list, 1), Some(0));
    }

    #[test]
    fn single_match_reached_within_len_minus_one_steps() {
        let names: Vec<String> = (0..9).map(|i| format!("entry{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let list = entries(&refs);
        let engine = SearchEngine::with_pattern("entry6");

        for start in 0..list.len() {
            if start == 6 {
                assert_eq!(engine.find_next(&list, start), None);
                continue;
            }
            let mut current = start;
            let mut steps = 0;
            while current != 6 {
                current = engine.find_next(&list, current).unwrap_or(current);
                steps += 1;
                assert!(steps < list.len());
            }
        }
    }

    #[test]
    fn no_match_never_moves() {
        let list = entries(&["a", "b", "c"]);
        let engine = SearchEngine::with_pattern("zzz");
        for start in 0..3 {
            assert_eq!(engine.find_next(&list, start), None);
            assert_eq!(engine.find_prev(&list, start), None);
        }
    }

    #[test]
    fn only_current_matches_is_no_move() {
        let list = entries(&["alpha", "beta", "gamma"]);
        let engine = SearchEngine::with_pattern("beta");
        assert_eq!(engine.find_next(&list, 1), None);
        assert_eq!(engine.find_prev(&list, 1), None);
    }

    #[test]
    fn invalid_pattern_matches_nothing() {
        let list = entries(&["(", "a(b"]);
        let mut engine = SearchEngine::new();
        assert!(!engine.set_pattern("a("));
        assert_eq!(engine.pattern(), "a(");
        assert!(engine.is_active());
        assert_eq!(engine.find_next(&list, 0), None);
        assert_eq!(engine.highlight("a(b"), None);
    }

    #[test]
    fn highlight_span() {
        let engine = SearchEngine::with_pattern("TXT");
        assert_eq!(engine.highlight("notes.txt"), Some(6..9));
        assert_eq!(engine.highlight("notes.md"), None);
        assert_eq!(SearchEngine::with_pattern("x*").highlight("abc"), None);
    }
}
