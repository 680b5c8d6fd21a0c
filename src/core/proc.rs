//! The spy process runner.
//!
//! Runs one shell command line at a time on behalf of the browser. [ProcessRunner::run] hands
//! the terminal to the child, records the child's pid for signal forwarding, waits for it and
//! classifies how it ended.
//!
//! For shells known to understand `pwd >&N`, the runner can also learn where the child's shell
//! ended up: a pipe is inherited by the child, the shell appends `pwd >&N` to the user's command
//! and the parent reads the path back after the child exits. This is what lets `cd` inside a
//! `shell` command move the browser.
//!
//! Command templates use a small substitution syntax, see [expand_template].

use crate::core::signals;
use crate::core::terminal::Frontend;

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Shell basenames that understand `pwd >&N`.
const RECOVERY_SHELLS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh"];

/// How the terminal is handled around a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Editor or pager hand-off. The command line is not echoed.
    Silent,
    /// Echo the command line, run it and return straight away.
    Interactive,
    /// Like [RunMode::Interactive] but waits for a key before redrawing.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Launching,
    Running {
        pid: u32,
    },
    Reaping,
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReport {
    Success,
    Status(i32),
    Signaled { signal: i32, core_dumped: bool },
}

impl ExitReport {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitReport::Signaled {
                    signal,
                    core_dumped: status.core_dumped(),
                };
            }
        }
        match status.code() {
            Some(0) => ExitReport::Success,
            Some(code) => ExitReport::Status(code),
            None => ExitReport::Status(-1),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitReport::Success)
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Success => write!(f, "done"),
            ExitReport::Status(code) => write!(f, "exit status {code}"),
            ExitReport::Signaled {
                signal,
                core_dumped,
            } => {
                match signal_name(*signal) {
                    Some(name) => write!(f, "killed by {name}")?,
                    None => write!(f, "killed by signal {signal}")?,
                }
                if *core_dumped {
                    write!(f, " (core dumped)")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(unix)]
fn signal_name(signal: i32) -> Option<&'static str> {
    let name = match signal {
        libc::SIGHUP => "SIGHUP",
        libc::SIGINT => "SIGINT",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGILL => "SIGILL",
        libc::SIGTRAP => "SIGTRAP",
        libc::SIGABRT => "SIGABRT",
        libc::SIGBUS => "SIGBUS",
        libc::SIGFPE => "SIGFPE",
        libc::SIGKILL => "SIGKILL",
        libc::SIGUSR1 => "SIGUSR1",
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGUSR2 => "SIGUSR2",
        libc::SIGPIPE => "SIGPIPE",
        libc::SIGALRM => "SIGALRM",
        libc::SIGTERM => "SIGTERM",
        libc::SIGXCPU => "SIGXCPU",
        libc::SIGXFSZ => "SIGXFSZ",
        _ => return None,
    };
    Some(name)
}

#[cfg(not(unix))]
fn signal_name(_signal: i32) -> Option<&'static str> {
    None
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot run {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot wait for child: {0}")]
    Wait(#[source] io::Error),
    #[error("cannot create cwd pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("terminal handoff failed: {0}")]
    Terminal(#[source] io::Error),
}

/// Result of a finished child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub report: ExitReport,
    /// Directory the child's shell finished in, when it could be recovered.
    pub new_cwd: Option<PathBuf>,
}

/// Whether `shell` is one of the shells cwd recovery is attempted for.
pub fn is_recognized_shell(shell: &Path) -> bool {
    shell
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| RECOVERY_SHELLS.contains(&n))
}

#[derive(Debug)]
pub struct ProcessRunner {
    shell: PathBuf,
    recover_cwd: bool,
    state: RunState,
}

impl ProcessRunner {
    pub fn new(shell: impl Into<PathBuf>, recover_cwd: bool) -> Self {
        ProcessRunner {
            shell: shell.into(),
            recover_cwd,
            state: RunState::Idle,
        }
    }

    // Accessors

    #[inline]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// True when commands will report their final directory back.
    pub fn recovers_cwd(&self) -> bool {
        self.recover_cwd && is_recognized_shell(&self.shell)
    }

    /// Runs `command` with `shell -c` in `cwd`, blocking until the child exits.
    ///
    /// The terminal is released for the duration of the child and always reacquired before
    /// returning, also on error.
    pub fn run(
        &mut self,
        command: &str,
        mode: RunMode,
        cwd: &Path,
        frontend: &mut dyn Frontend,
    ) -> Result<RunOutcome, RunError> {
        self.state = RunState::Launching;
        let result = self.run_released(command, mode, cwd, frontend);
        self.state = RunState::Idle;

        let reacquired = frontend.reacquire().map_err(RunError::Terminal);
        let outcome = result?;
        reacquired?;
        Ok(outcome)
    }

    fn run_released(
        &mut self,
        command: &str,
        mode: RunMode,
        cwd: &Path,
        frontend: &mut dyn Frontend,
    ) -> Result<RunOutcome, RunError> {
        frontend.release().map_err(RunError::Terminal)?;
        if mode != RunMode::Silent {
            frontend.echo(command).map_err(RunError::Terminal)?;
        }

        let pipe = if self.recovers_cwd() {
            Some(CwdPipe::new().map_err(RunError::Pipe)?)
        } else {
            None
        };

        let script = match &pipe {
            Some(pipe) => recovery_script(command, pipe.write_fd()),
            None => command.to_string(),
        };

        tracing::debug!(shell = %self.shell.display(), command, ?mode, "launching");
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&script)
            .current_dir(cwd)
            .spawn()
            .map_err(|source| RunError::Spawn {
                shell: self.shell.display().to_string(),
                source,
            })?;

        // Only the child may hold the write end from here on.
        let pipe = pipe.map(CwdPipe::into_reader);

        let pid = child.id();
        self.state = RunState::Running { pid };
        signals::set_child(pid);
        let waited = child.wait();
        signals::clear_child();
        self.state = RunState::Reaping;

        let status = waited.map_err(RunError::Wait)?;
        let report = ExitReport::from_status(status);
        let new_cwd = pipe.and_then(CwdReader::drain);
        tracing::info!(pid, %report, new_cwd = ?new_cwd, "child reaped");

        if mode == RunMode::Continue {
            if !report.is_success() {
                frontend.echo(&report.to_string()).map_err(RunError::Terminal)?;
            }
            frontend.pause("Continue: ").map_err(RunError::Terminal)?;
        }

        Ok(RunOutcome { report, new_cwd })
    }
}

/// Pipe whose write end survives `exec` in the child.
#[cfg(unix)]
struct CwdPipe {
    read: std::os::fd::OwnedFd,
    write: std::os::fd::OwnedFd,
}

#[cfg(unix)]
impl CwdPipe {
    fn new() -> io::Result<Self> {
        use std::os::fd::{FromRawFd, OwnedFd};

        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: fds has room for the two descriptors pipe() writes. Both are fresh and owned
        // by nothing else, so wrapping them in OwnedFd is sound.
        unsafe {
            if libc::pipe(fds.as_mut_ptr()) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(CwdPipe {
                read: OwnedFd::from_raw_fd(fds[0]),
                write: OwnedFd::from_raw_fd(fds[1]),
            })
        }
    }

    fn write_fd(&self) -> i32 {
        use std::os::fd::AsRawFd;
        self.write.as_raw_fd()
    }

    fn into_reader(self) -> CwdReader {
        drop(self.write);
        CwdReader { read: self.read }
    }
}

#[cfg(unix)]
struct CwdReader {
    read: std::os::fd::OwnedFd,
}

#[cfg(unix)]
impl CwdReader {
    /// Reads whatever the child wrote without blocking and returns the last absolute path.
    fn drain(self) -> Option<PathBuf> {
        use std::os::fd::AsRawFd;

        let fd = self.read.as_raw_fd();
        // SAFETY: fd is a valid open descriptor owned by self.read.
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return None;
            }
        }

        let mut file = std::fs::File::from(self.read);
        let mut out = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        parse_reported_cwd(&out)
    }
}

#[cfg(not(unix))]
struct CwdPipe;

#[cfg(not(unix))]
impl CwdPipe {
    fn new() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "cwd recovery needs a unix shell",
        ))
    }

    fn write_fd(&self) -> i32 {
        -1
    }

    fn into_reader(self) -> CwdReader {
        CwdReader
    }
}

#[cfg(not(unix))]
struct CwdReader;

#[cfg(not(unix))]
impl CwdReader {
    fn drain(self) -> Option<PathBuf> {
        None
    }
}

/// Wraps `command` so the shell reports its final directory on `fd`.
///
/// The command's own status is saved before `pwd` runs and re-raised afterwards.
fn recovery_script(command: &str, fd: i32) -> String {
    format!(
        "{command}\n__spy_rc=$?\npwd {} 2>/dev/null\nexit $__spy_rc",
        report_redirect(fd)
    )
}

/// Redirection that sends `pwd` to descriptor `fd`. Some shells only accept single-digit
/// descriptors after `>&`.
fn report_redirect(fd: i32) -> String {
    if (0..=9).contains(&fd) {
        format!(">&{fd}")
    } else {
        format!(">/dev/fd/{fd}")
    }
}

/// Last non-empty line of `bytes`, if it is an absolute path.
fn parse_reported_cwd(bytes: &[u8]) -> Option<PathBuf> {
    let line = bytes
        .split(|&b| b == b'\n')
        .rev()
        .find(|line| !line.is_empty())?;

    #[cfg(unix)]
    let path = {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(std::ffi::OsStr::from_bytes(line))
    };
    #[cfg(not(unix))]
    let path = PathBuf::from(String::from_utf8_lossy(line).into_owned());

    path.is_absolute().then_some(path)
}

/// Quotes an entry name for the shell.
///
/// Names made only of `[A-Za-z0-9_.-]` pass through. Anything else is single-quoted, with
/// embedded quotes written as `'\''`.
pub fn quote_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'));
    if plain {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('\'');
    for c in name.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Expands a command template.
///
/// - `\%` becomes a literal `%`.
/// - `%` becomes the quoted entry name ([quote_name]).
/// - `~` at the start of a word, followed by `/`, whitespace or the end, becomes `home`.
///
/// Everything else, other backslashes included, is passed to the shell unchanged.
pub fn expand_template(template: &str, name: &str, home: &Path) -> String {
    let mut out = String::with_capacity(template.len() + name.len());
    let mut chars = template.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'%') => {
                chars.next();
                out.push('%');
                prev = Some('%');
                continue;
            }
            '%' => out.push_str(&quote_name(name)),
            '~' if prev.is_none_or(char::is_whitespace)
                && chars.peek().is_none_or(|&n| n == '/' || n.is_whitespace()) =>
            {
                out.push_str(&home.to_string_lossy());
            }
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}
