//! Process environment as spy sees it.
//!
//! Read once at startup. Fallbacks are resolved here so the rest of the program never looks at
//! environment variables directly.

use crate::utils::get_home;

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_SHELL: &str = "/bin/sh";
const EDITOR_CANDIDATES: &[&str] = &["vim", "vi", "nano"];
const PAGER_CANDIDATES: &[&str] = &["less", "more"];

#[derive(Debug, Clone)]
pub struct Environment {
    home: Option<PathBuf>,
    shell: PathBuf,
    editor: String,
    pager: String,
    title: String,
}

/// Non-empty value of `name`.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// First candidate found on PATH, else the last one.
fn first_on_path(candidates: &[&'static str]) -> String {
    candidates
        .iter()
        .find(|c| which::which(c).is_ok())
        .or(candidates.last())
        .map_or_else(String::new, |c| (*c).to_string())
}

#[cfg(unix)]
fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for buf.len() bytes; gethostname writes at most that many.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn hostname() -> Option<String> {
    var("COMPUTERNAME")
}

impl Environment {
    pub fn from_process() -> Self {
        let user = var("USER").or_else(|| var("LOGNAME"));
        let title = match (user, hostname()) {
            (Some(user), Some(host)) => format!("{user}@{host}"),
            (Some(user), None) => user,
            (None, Some(host)) => host,
            (None, None) => "spy".to_string(),
        };

        Environment {
            home: get_home(),
            shell: var("SHELL").map_or_else(|| PathBuf::from(DEFAULT_SHELL), PathBuf::from),
            editor: var("EDITOR")
                .or_else(|| var("VISUAL"))
                .unwrap_or_else(|| first_on_path(EDITOR_CANDIDATES)),
            pager: var("PAGER").unwrap_or_else(|| first_on_path(PAGER_CANDIDATES)),
            title,
        }
    }

    /// Fixed environment for tests and embedding.
    pub fn fixed(home: Option<PathBuf>, shell: impl Into<PathBuf>) -> Self {
        Environment {
            home,
            shell: shell.into(),
            editor: "vi".to_string(),
            pager: "more".to_string(),
            title: "spy".to_string(),
        }
    }

    // Accessors

    #[inline]
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    #[inline]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    #[inline]
    pub fn editor(&self) -> &str {
        &self.editor
    }

    #[inline]
    pub fn pager(&self) -> &str {
        &self.pager
    }

    /// `user@host` for the header line.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Command template for `enter` on a file.
    pub fn editor_command(&self) -> String {
        format!("{} %", self.editor)
    }

    /// Command template for `display` on a file.
    pub fn pager_command(&self) -> String {
        format!("{} %", self.pager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_picks_last_when_none_found() {
        assert_eq!(first_on_path(&["spy-no-such-tool-a", "spy-no-such-tool-b"]), "spy-no-such-tool-b");
    }

    #[test]
    fn command_templates() {
        let env = Environment::fixed(Some(PathBuf::from("/home/me")), "/bin/bash");
        assert_eq!(env.editor_command(), "vi %");
        assert_eq!(env.pager_command(), "more %");
        assert_eq!(env.home(), Some(Path::new("/home/me")));
        assert_eq!(env.shell(), Path::new("/bin/bash"));
    }

    #[test]
    fn process_environment_always_has_a_shell() {
        let env = Environment::from_process();
        assert!(!env.shell().as_os_str().is_empty());
        assert!(!env.editor().is_empty());
        assert!(!env.pager().is_empty());
        assert!(!env.title().is_empty());
    }
}
