//! The main config loading module for spy.
//!
//! Parses the built-in defaults, then the first user file found, into one [Config].
//! Warnings from either source are collected, printed to stderr before the terminal is taken
//! over and mirrored to the log.

use crate::app::keymap::KeyBindingTable;
use crate::config::defaults::DEFAULT_CONFIG;
use crate::config::parser::{ConfigDiagnostic, ConfigParser, Settings};
use crate::config::rules::{ColorRules, IgnoreRules};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory, then in the home directory.
pub const CONFIG_FILE_NAME: &str = ".spyrc";

/// Environment variable that overrides the user config location.
pub const CONFIG_ENV_VAR: &str = "SPY_CONFIG";

#[derive(Debug)]
pub struct Config {
    keymap: KeyBindingTable,
    colors: ColorRules,
    ignores: IgnoreRules,
    settings: Settings,
    diagnostics: Vec<ConfigDiagnostic>,
    user_path: Option<PathBuf>,
}

impl Config {
    /// Loads the defaults and the user file, reporting warnings on stderr.
    pub fn load(home: Option<&Path>) -> Self {
        let override_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let cwd = std::env::current_dir().ok();
        let user_path = user_path_from(override_path, cwd.as_deref(), home);

        let user_text = match &user_path {
            Some(path) => match fs::read_to_string(path) {
                Ok(text) => Some((path.clone(), text)),
                Err(e) => {
                    eprintln!("[spy] Warning: cannot read {}: {}", path.display(), e);
                    tracing::warn!(path = %path.display(), error = %e, "config read failed");
                    None
                }
            },
            None => None,
        };

        let config = match user_text {
            Some((path, text)) => Self::from_sources(Some((path.as_path(), text.as_str()))),
            None => Self::from_sources(None),
        };
        config.report();
        config
    }

    /// Builds a config from the defaults plus an optional user file's path and contents.
    pub fn from_sources(user: Option<(&Path, &str)>) -> Self {
        let mut parser = ConfigParser::new();
        parser.parse_str("<defaults>", DEFAULT_CONFIG);
        if let Some((path, text)) = user {
            parser.parse_str(&path.display().to_string(), text);
        }

        Config {
            keymap: parser.keymap,
            colors: parser.colors,
            ignores: parser.ignores,
            settings: parser.settings,
            diagnostics: parser.diagnostics,
            user_path: user.map(|(path, _)| path.to_path_buf()),
        }
    }

    fn report(&self) {
        for diag in &self.diagnostics {
            eprintln!("[spy] Warning: {diag}");
            tracing::warn!(origin = %diag.origin, line = diag.line, "{}", diag.warning);
        }
        tracing::debug!(
            bindings = self.keymap.len(),
            colors = self.colors.len(),
            user = ?self.user_path,
            "config loaded"
        );
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

    #[inline]
    pub fn user_path(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Splits the config into the parts the session takes ownership of.
    pub fn into_parts(self) -> (KeyBindingTable, ColorRules, IgnoreRules, Settings) {
        (self.keymap, self.colors, self.ignores, self.settings)
    }
}

/// Picks the user config file.
///
/// An explicit override is used as given, even when it does not exist, so a typo surfaces as a
/// read warning. Otherwise the first existing of `<cwd>/.spyrc` and `<home>/.spyrc`.
pub fn user_path_from(
    override_path: Option<PathBuf>,
    cwd: Option<&Path>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = override_path.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    [cwd, home]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Writes the built-in configuration to `path`, refusing to overwrite an existing file.
pub fn write_default_config(path: &Path) -> io::Result<()> {
    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }
    fs::write(path, DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::keymap::parse_key;
    use tempfile::tempdir;

    #[test]
    fn user_file_overrides_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let path = Path::new("/tmp/.spyrc");
        let config = Config::from_sources(Some((path, "map q refresh\nset searchhistory 1\n")));

        let key = parse_key("q").ok_or("bad key")?;
        let bound = config.keymap().get(&key).ok_or("unbound")?;
        assert_eq!(bound.name(), "refresh");
        assert!(config.settings().search_history);
        assert_eq!(config.user_path(), Some(path));
        assert!(config.diagnostics().is_empty());
        Ok(())
    }

    #[test]
    fn user_warnings_name_the_file() {
        let config = Config::from_sources(Some((Path::new("rc"), "\nmap j down extra\n")));
        let rendered: Vec<String> = config.diagnostics().iter().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            ["rc:2: command 'down' takes no argument, argument ignored"]
        );
    }

    #[test]
    fn lookup_order() -> Result<(), Box<dyn std::error::Error>> {
        let cwd = tempdir()?;
        let home = tempdir()?;

        assert_eq!(user_path_from(None, Some(cwd.path()), Some(home.path())), None);

        fs::write(home.path().join(CONFIG_FILE_NAME), "")?;
        assert_eq!(
            user_path_from(None, Some(cwd.path()), Some(home.path())),
            Some(home.path().join(CONFIG_FILE_NAME))
        );

        fs::write(cwd.path().join(CONFIG_FILE_NAME), "")?;
        assert_eq!(
            user_path_from(None, Some(cwd.path()), Some(home.path())),
            Some(cwd.path().join(CONFIG_FILE_NAME))
        );

        let explicit = PathBuf::from("/nonexistent/spyrc");
        assert_eq!(
            user_path_from(Some(explicit.clone()), Some(cwd.path()), Some(home.path())),
            Some(explicit)
        );
        Ok(())
    }

    #[test]
    fn default_config_is_written_once() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, DEFAULT_CONFIG);
        assert!(write_default_config(&path).is_err());
        Ok(())
    }
}
