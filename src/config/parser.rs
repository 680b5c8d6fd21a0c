//! Parser for the `.spyrc` line language.
//!
//! One directive per line, `#` at the start of a line begins a comment:
//!
//! ```text
//! map <key-name> <command> [argument to end of line]
//! color <glob|-dir|-x|-ro|-link|-tagged> <color>
//! ignoremask <glob> [group]
//! ignoredefault <group> <0|1>
//! set <option> <value>
//! ```
//!
//! A bad line is reported as a [ConfigDiagnostic] and skipped; parsing never stops early.

use crate::app::commands::{self, Arity};
use crate::app::keymap::{KeyBindingTable, parse_key};
use crate::config::rules::{ColorPredicate, ColorRules, IgnoreRules};
use crate::utils::parse_color;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{0}' takes no argument, argument ignored")]
    UnexpectedArgument(String),
    #[error("command '{0}' needs an argument")]
    MissingArgument(String),
    #[error("invalid pattern '{pattern}': {reason}")]
    BadPattern { pattern: String, reason: String },
    #[error("unknown color '{0}'")]
    UnknownColor(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("expected 0 or 1 for '{option}', got '{value}'")]
    BadFlag { option: String, value: String },
}

/// A warning with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiagnostic {
    pub origin: String,
    pub line: usize,
    pub warning: ConfigWarning,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.origin, self.line, self.warning)
    }
}

/// Options set with the `set` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Persist search history to `~/.spy_searches`.
    pub search_history: bool,
    /// Let recognised shells report their final directory back.
    pub cwd_recovery: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            search_history: false,
            cwd_recovery: true,
        }
    }
}

/// Accumulates directives from any number of sources, in order.
#[derive(Debug, Default)]
pub struct ConfigParser {
    pub(crate) keymap: KeyBindingTable,
    pub(crate) colors: ColorRules,
    pub(crate) ignores: IgnoreRules,
    pub(crate) settings: Settings,
    pub(crate) diagnostics: Vec<ConfigDiagnostic>,
}

/// Splits off the first whitespace-delimited field.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], s[end..].trim_start()))
}

/// Cuts a trailing comment: a `#` that starts a word outside quotes ends the line.
fn strip_comment(s: &str) -> &str {
    let mut quote = None;
    let mut prev_blank = true;
    for (idx, c) in s.char_indices() {
        match (quote, c) {
            (None, '#') if prev_blank => return s[..idx].trim_end(),
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            _ => {}
        }
        prev_blank = c.is_whitespace();
    }
    s.trim_end()
}

fn parse_flag(option: &str, value: &str) -> Result<bool, ConfigWarning> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(ConfigWarning::BadFlag {
            option: option.to_string(),
            value: value.to_string(),
        }),
    }
}

impl ConfigParser {
    pub fn new() -> Self {
        Self::default()
    }

    // Accessors

    #[inline]
    pub fn keymap(&self) -> &KeyBindingTable {
        &self.keymap
    }

    #[inline]
    pub fn colors(&self) -> &ColorRules {
        &self.colors
    }

    #[inline]
    pub fn ignores(&self) -> &IgnoreRules {
        &self.ignores
    }

    #[inline]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    #[inline]
    pub fn diagnostics(&self) -> &[ConfigDiagnostic] {
        &self.diagnostics
    }

    /// Parses a whole file. `origin` names it in diagnostics.
    pub fn parse_str(&mut self, origin: &str, text: &str) {
        for (idx, line) in text.lines().enumerate() {
            if let Err(warning) = self.parse_line(line) {
                self.diagnostics.push(ConfigDiagnostic {
                    origin: origin.to_string(),
                    line: idx + 1,
                    warning,
                });
            }
        }
    }

    /// Applies one line. Blank lines and comments are accepted silently.
    ///
    /// A `map` whose argument count does not fit the command still installs the binding and
    /// then reports the mismatch.
    pub fn parse_line(&mut self, line: &str) -> Result<(), ConfigWarning> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let Some((directive, rest)) = next_field(line) else {
            return Ok(());
        };

        // `map` strips after its key field, so `#` stays bindable.
        if directive == "map" {
            return self.parse_map(rest);
        }
        let rest = strip_comment(rest);
        match directive {
            "color" => self.parse_color(rest),
            "ignoremask" => self.parse_ignoremask(rest),
            "ignoredefault" => self.parse_ignoredefault(rest),
            "set" => self.parse_set(rest),
            other => Err(ConfigWarning::UnknownDirective(other.to_string())),
        }
    }

    fn parse_map(&mut self, rest: &str) -> Result<(), ConfigWarning> {
        const USAGE: &str = "map <key> <command> [argument]";
        let (key_name, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        let (command, arg) = next_field(strip_comment(rest)).ok_or(ConfigWarning::Usage(USAGE))?;

        let key = parse_key(key_name).ok_or_else(|| ConfigWarning::UnknownKey(key_name.to_string()))?;
        let arg = (!arg.is_empty()).then_some(arg);
        let (resolved, arity) = commands::resolve(command, arg)
            .ok_or_else(|| ConfigWarning::UnknownCommand(command.to_string()))?;

        self.keymap.bind(key, resolved);
        match arity {
            None => Ok(()),
            Some(Arity::UnexpectedArgument) => {
                Err(ConfigWarning::UnexpectedArgument(command.to_string()))
            }
            Some(Arity::MissingArgument) => Err(ConfigWarning::MissingArgument(command.to_string())),
        }
    }

    fn parse_color(&mut self, rest: &str) -> Result<(), ConfigWarning> {
        const USAGE: &str = "color <glob|-dir|-x|-ro|-link|-tagged> <color>";
        let (pattern, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        let (color_name, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        if !rest.is_empty() {
            return Err(ConfigWarning::Usage(USAGE));
        }

        let color =
            parse_color(color_name).ok_or_else(|| ConfigWarning::UnknownColor(color_name.to_string()))?;
        let predicate = ColorPredicate::parse(pattern).map_err(|e| ConfigWarning::BadPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })?;
        self.colors.push(predicate, color);
        Ok(())
    }

    fn parse_ignoremask(&mut self, rest: &str) -> Result<(), ConfigWarning> {
        const USAGE: &str = "ignoremask <glob> [group]";
        let (pattern, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        let (label, rest) = next_field(rest).unwrap_or((IgnoreRules::DEFAULT_GROUP, ""));
        if !rest.is_empty() {
            return Err(ConfigWarning::Usage(USAGE));
        }

        self.ignores
            .add_pattern(pattern, label)
            .map_err(|e| ConfigWarning::BadPattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })
    }

    fn parse_ignoredefault(&mut self, rest: &str) -> Result<(), ConfigWarning> {
        const USAGE: &str = "ignoredefault <group> <0|1>";
        let (label, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        let (value, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        if !rest.is_empty() {
            return Err(ConfigWarning::Usage(USAGE));
        }

        let enabled = parse_flag(label, value)?;
        self.ignores.set_enabled(label, enabled);
        Ok(())
    }

    fn parse_set(&mut self, rest: &str) -> Result<(), ConfigWarning> {
        const USAGE: &str = "set <option> <value>";
        let (option, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        let (value, rest) = next_field(rest).ok_or(ConfigWarning::Usage(USAGE))?;
        if !rest.is_empty() {
            return Err(ConfigWarning::Usage(USAGE));
        }

        match option {
            "searchhistory" => self.settings.search_history = parse_flag(option, value)?,
            "cwdrecovery" => self.settings.cwd_recovery = parse_flag(option, value)?,
            other => return Err(ConfigWarning::UnknownOption(other.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::keymap::Key;
    use crossterm::event::KeyCode;
    use std::ffi::OsStr;

    fn bound(parser: &ConfigParser, key: &str) -> Option<(String, Option<String>)> {
        let cmd = parser.keymap().get(&parse_key(key)?)?;
        Some((cmd.name().to_string(), cmd.arg().map(str::to_string)))
    }

    #[test]
    fn map_installs_binding() {
        let mut p = ConfigParser::new();
        assert_eq!(p.parse_line("map j down"), Ok(()));
        assert_eq!(bound(&p, "j"), Some(("down".to_string(), None)));
    }

    #[test]
    fn map_extra_argument_warns_but_binds() {
        let mut p = ConfigParser::new();
        assert_eq!(
            p.parse_line("map j down extra"),
            Err(ConfigWarning::UnexpectedArgument("down".to_string()))
        );
        assert_eq!(bound(&p, "j"), Some(("down".to_string(), None)));
    }

    #[test]
    fn map_argument_runs_to_end_of_line() {
        let mut p = ConfigParser::new();
        assert_eq!(p.parse_line("map m shell make -j4   all"), Ok(()));
        assert_eq!(
            bound(&p, "m"),
            Some(("shell".to_string(), Some("make -j4   all".to_string())))
        );
    }

    #[test]
    fn trailing_comments_are_dropped() {
        let mut p = ConfigParser::new();
        assert_eq!(p.parse_line("map j down # move"), Ok(()));
        assert_eq!(bound(&p, "j"), Some(("down".to_string(), None)));

        assert_eq!(p.parse_line("ignoremask *.o   # object files"), Ok(()));
        assert!(p.ignores().is_ignored(OsStr::new("main.o")));

        assert_eq!(p.parse_line("set cwdrecovery 0 # off"), Ok(()));
        assert!(!p.settings().cwd_recovery);
    }

    #[test]
    fn hash_inside_a_word_or_quotes_is_kept() {
        let mut p = ConfigParser::new();
        assert_eq!(p.parse_line("map # shell echo 'a # b' x#y # note"), Ok(()));
        assert_eq!(
            bound(&p, "#"),
            Some(("shell".to_string(), Some("echo 'a # b' x#y".to_string())))
        );
        assert_eq!(strip_comment("#only"), "");
        assert_eq!(strip_comment("a\t#b"), "a");
    }

    #[test]
    fn map_missing_argument_warns_but_binds() {
        let mut p = ConfigParser::new();
        assert_eq!(
            p.parse_line("map x silent"),
            Err(ConfigWarning::MissingArgument("silent".to_string()))
        );
        assert_eq!(bound(&p, "x"), Some(("silent".to_string(), Some(String::new()))));
    }

    #[test]
    fn bad_map_lines_are_skipped() {
        let mut p = ConfigParser::new();
        assert_eq!(
            p.parse_line("map NoSuchKey down"),
            Err(ConfigWarning::UnknownKey("NoSuchKey".to_string()))
        );
        assert_eq!(
            p.parse_line("map z fly"),
            Err(ConfigWarning::UnknownCommand("fly".to_string()))
        );
        assert!(matches!(p.parse_line("map z"), Err(ConfigWarning::Usage(_))));
        assert!(p.keymap().is_empty());
    }

    #[test]
    fn later_sources_override() {
        let mut p = ConfigParser::new();
        p.parse_str("defaults", "map q quit\nmap Enter enter\n");
        p.parse_str("user", "map q refresh\n");
        assert_eq!(bound(&p, "q"), Some(("refresh".to_string(), None)));
        assert_eq!(bound(&p, "Enter"), Some(("enter".to_string(), None)));
        assert!(p.keymap().get(&Key::plain(KeyCode::Enter)).is_some());
    }

    #[test]
    fn diagnostics_carry_origin_and_line() {
        let mut p = ConfigParser::new();
        p.parse_str("test.spyrc", "# comment\n\n  # indented comment\nbogus line\nmap j down\n");
        assert_eq!(p.diagnostics().len(), 1);
        let d = &p.diagnostics()[0];
        assert_eq!(d.line, 4);
        assert_eq!(d.to_string(), "test.spyrc:4: unknown directive 'bogus'");
    }

    #[test]
    fn colors_and_ignores() {
        let mut p = ConfigParser::new();
        p.parse_str(
            "t",
            "color -dir yellow\ncolor *.rs #00ff00\nignoremask *.o\nignoremask .* dot\nignoredefault dot 0\n",
        );
        assert!(p.diagnostics().is_empty());
        assert_eq!(p.colors().len(), 2);
        assert!(p.ignores().is_ignored(OsStr::new("x.o")));
        assert!(!p.ignores().is_ignored(OsStr::new(".git")));

        assert_eq!(
            p.parse_line("color -dir chartreuse"),
            Err(ConfigWarning::UnknownColor("chartreuse".to_string()))
        );
        assert!(matches!(
            p.parse_line("ignoremask [oops"),
            Err(ConfigWarning::BadPattern { .. })
        ));
        assert!(matches!(
            p.parse_line("ignoredefault dot maybe"),
            Err(ConfigWarning::BadFlag { .. })
        ));
    }

    #[test]
    fn set_options() {
        let mut p = ConfigParser::new();
        assert_eq!(p.settings(), Settings::default());
        assert_eq!(p.parse_line("set searchhistory 1"), Ok(()));
        assert_eq!(p.parse_line("set cwdrecovery 0"), Ok(()));
        assert!(p.settings().search_history);
        assert!(!p.settings().cwd_recovery);
        assert_eq!(
            p.parse_line("set colour 1"),
            Err(ConfigWarning::UnknownOption("colour".to_string()))
        );
    }

    #[test]
    fn builtin_defaults_parse_cleanly() {
        let mut p = ConfigParser::new();
        p.parse_str("<defaults>", crate::config::defaults::DEFAULT_CONFIG);
        assert_eq!(p.diagnostics(), &[]);
        assert_eq!(bound(&p, "C-c"), Some(("quit".to_string(), None)));
        assert_eq!(bound(&p, "KEY_NPAGE"), Some(("pagedown".to_string(), None)));
    }
}
