//! Command registry for spy.
//!
//! Every bindable command is a static entry mapping its name to a no-argument handler, a
//! string-argument handler, or both. Resolving a name with an optional argument yields a
//! [Command] ready to bind to a key.

use crate::app::session::Session;

use phf::phf_map;
use std::fmt;

pub type NoArgFn = fn(&mut Session);
pub type WithArgFn = fn(&mut Session, &str);

#[derive(Clone, Copy)]
pub struct CommandSpec {
    pub no_arg: Option<NoArgFn>,
    pub with_arg: Option<WithArgFn>,
}

const fn no_arg(run: NoArgFn) -> CommandSpec {
    CommandSpec {
        no_arg: Some(run),
        with_arg: None,
    }
}

const fn with_arg(run: WithArgFn) -> CommandSpec {
    CommandSpec {
        no_arg: None,
        with_arg: Some(run),
    }
}

const fn either(plain: NoArgFn, run: WithArgFn) -> CommandSpec {
    CommandSpec {
        no_arg: Some(plain),
        with_arg: Some(run),
    }
}

#[rustfmt::skip]
static COMMANDS: phf::Map<&'static str, CommandSpec> = phf_map! {
    "up"           => no_arg(Session::cmd_up),
    "down"         => no_arg(Session::cmd_down),
    "left"         => no_arg(Session::cmd_left),
    "right"        => no_arg(Session::cmd_right),
    "pageup"       => no_arg(Session::cmd_page_up),
    "pagedown"     => no_arg(Session::cmd_page_down),
    "first"        => no_arg(Session::cmd_first),
    "last"         => no_arg(Session::cmd_last),
    "dirup"        => no_arg(Session::cmd_dir_up),
    "dirdown"      => no_arg(Session::cmd_dir_down),
    "enter"        => no_arg(Session::cmd_enter),
    "display"      => no_arg(Session::cmd_display),
    "jump"         => either(Session::cmd_jump_prompt, Session::cmd_jump),
    "search"       => either(Session::cmd_search_prompt, Session::cmd_search),
    "searchnext"   => no_arg(Session::cmd_search_next),
    "searchprev"   => no_arg(Session::cmd_search_prev),
    "execute"      => either(Session::cmd_execute_prompt, Session::cmd_execute),
    "shell"        => with_arg(Session::cmd_execute),
    "interactive"  => with_arg(Session::cmd_interactive),
    "silent"       => with_arg(Session::cmd_silent),
    "detail"       => either(Session::cmd_detail_cycle, Session::cmd_detail),
    "toggleignore" => either(Session::cmd_toggle_ignore_default, Session::cmd_toggle_ignore),
    "tag"          => no_arg(Session::cmd_tag),
    "refresh"      => no_arg(Session::cmd_refresh),
    "redraw"       => no_arg(Session::cmd_redraw),
    "quit"         => no_arg(Session::cmd_quit),
};

/// A resolved command, with its argument bound when it takes one.
#[derive(Clone)]
pub enum Command {
    NoArg {
        name: &'static str,
        run: NoArgFn,
    },
    WithArg {
        name: &'static str,
        run: WithArgFn,
        arg: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NoArg { name, .. } | Command::WithArg { name, .. } => *name,
        }
    }

    pub fn arg(&self) -> Option<&str> {
        match self {
            Command::NoArg { .. } => None,
            Command::WithArg { arg, .. } => Some(arg.as_str()),
        }
    }

    pub fn execute(&self, session: &mut Session) {
        match self {
            Command::NoArg { run, .. } => run(session),
            Command::WithArg { run, arg, .. } => run(session, arg),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arg() {
            Some(arg) => write!(f, "{} {:?}", self.name(), arg),
            None => write!(f, "{}", self.name()),
        }
    }
}

/// Argument count problem found while resolving. The command is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// An argument was given to a command that takes none; it is dropped.
    UnexpectedArgument,
    /// No argument was given to a command that needs one; it gets an empty one.
    MissingArgument,
}

pub fn is_known(name: &str) -> bool {
    COMMANDS.contains_key(name)
}

/// Names of every command, for help output.
pub fn names() -> impl Iterator<Item = &'static str> {
    COMMANDS.keys().copied()
}

/// Resolves `name` with an optional argument. `None` when no such command exists.
pub fn resolve(name: &str, arg: Option<&str>) -> Option<(Command, Option<Arity>)> {
    let (&name, spec) = COMMANDS.get_entry(name)?;
    let arg = arg.filter(|a| !a.is_empty());

    let resolved = match (arg, spec.no_arg, spec.with_arg) {
        (Some(arg), _, Some(run)) => (
            Command::WithArg {
                name,
                run,
                arg: arg.to_string(),
            },
            None,
        ),
        (Some(_), Some(run), None) => (Command::NoArg { name, run }, Some(Arity::UnexpectedArgument)),
        (None, Some(run), _) => (Command::NoArg { name, run }, None),
        (None, None, Some(run)) => (
            Command::WithArg {
                name,
                run,
                arg: String::new(),
            },
            Some(Arity::MissingArgument),
        ),
        (_, None, None) => return None,
    };
    Some(resolved)
}
