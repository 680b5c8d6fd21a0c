//! Ignore and color rule sets built from the `ignoremask`, `ignoredefault` and `color`
//! directives.
//!
//! Both sets are built once at startup. The only mutation afterwards is enabling or disabling
//! an ignore group, which the caller follows with a listing rebuild.

use crate::core::FileEntry;

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use ratatui::style::Color;
use std::ffi::OsStr;
use std::path::Path;

fn compile_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(false).build()
}

/// One labelled group of ignore globs.
#[derive(Debug, Clone)]
pub struct IgnoreGroup {
    label: String,
    patterns: Vec<Glob>,
    set: GlobSet,
    enabled: bool,
}

impl IgnoreGroup {
    fn new(label: &str) -> Self {
        IgnoreGroup {
            label: label.to_string(),
            patterns: Vec::new(),
            set: GlobSet::empty(),
            enabled: true,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    fn rebuild(&mut self) -> Result<(), globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for glob in &self.patterns {
            builder.add(glob.clone());
        }
        self.set = builder.build()?;
        Ok(())
    }
}

/// Labelled ignore groups. An entry is hidden when any enabled group matches its name.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    groups: Vec<IgnoreGroup>,
}

impl IgnoreRules {
    pub const DEFAULT_GROUP: &'static str = "0";

    pub fn new() -> Self {
        Self::default()
    }

    fn group_mut(&mut self, label: &str) -> &mut IgnoreGroup {
        let idx = match self.groups.iter().position(|g| g.label == label) {
            Some(idx) => idx,
            None => {
                self.groups.push(IgnoreGroup::new(label));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }

    pub fn group(&self, label: &str) -> Option<&IgnoreGroup> {
        self.groups.iter().find(|g| g.label == label)
    }

    pub fn groups(&self) -> &[IgnoreGroup] {
        &self.groups
    }

    /// Adds a glob to the group, creating the group (enabled) if it does not exist yet.
    pub fn add_pattern(&mut self, pattern: &str, label: &str) -> Result<(), globset::Error> {
        let glob = compile_glob(pattern)?;
        let group = self.group_mut(label);
        group.patterns.push(glob);
        group.rebuild()
    }

    pub fn set_enabled(&mut self, label: &str, enabled: bool) {
        self.group_mut(label).enabled = enabled;
    }

    /// Flips a group. Returns the new state, or `None` when no such group exists.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let group = self.groups.iter_mut().find(|g| g.label == label)?;
        group.enabled = !group.enabled;
        Some(group.enabled)
    }

    pub fn is_ignored(&self, name: &OsStr) -> bool {
        let path = Path::new(name);
        self.groups
            .iter()
            .any(|g| g.enabled && g.set.is_match(path))
    }
}

/// What a color rule tests an entry for.
#[derive(Debug, Clone)]
pub enum ColorPredicate {
    Directory,
    Executable,
    ReadOnly,
    Symlink,
    Tagged,
    Glob(GlobMatcher),
}

impl ColorPredicate {
    /// Parses the first field of a `color` directive: one of the dash flags or a glob.
    pub fn parse(field: &str) -> Result<Self, globset::Error> {
        Ok(match field {
            "-dir" => ColorPredicate::Directory,
            "-x" => ColorPredicate::Executable,
            "-ro" => ColorPredicate::ReadOnly,
            "-link" => ColorPredicate::Symlink,
            "-tagged" => ColorPredicate::Tagged,
            pattern => ColorPredicate::Glob(compile_glob(pattern)?.compile_matcher()),
        })
    }

    fn matches(&self, entry: &FileEntry, dir: &Path, tagged: bool) -> bool {
        match self {
            ColorPredicate::Directory => entry.is_dir(),
            ColorPredicate::Executable => entry.attrs(dir).is_executable(),
            ColorPredicate::ReadOnly => entry.attrs(dir).is_read_only(),
            ColorPredicate::Symlink => entry.is_symlink(),
            ColorPredicate::Tagged => tagged,
            ColorPredicate::Glob(matcher) => matcher.is_match(Path::new(entry.name())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorRule {
    predicate: ColorPredicate,
    color: Color,
}

/// Ordered color rules. Every rule is evaluated and the last match wins.
#[derive(Debug, Clone, Default)]
pub struct ColorRules {
    rules: Vec<ColorRule>,
}

impl ColorRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: ColorPredicate, color: Color) {
        self.rules.push(ColorRule { predicate, color });
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Color for an entry listed in `dir`; [Color::Reset] when nothing matches.
    pub fn color_for(&self, entry: &FileEntry, dir: &Path, tagged: bool) -> Color {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.predicate.matches(entry, dir, tagged))
            .map_or(Color::Reset, |rule| rule.color)
    }
}
