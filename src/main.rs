//! main.rs
//! Entry point for spy

pub(crate) mod app;
pub(crate) mod config;
pub(crate) mod core;
pub(crate) mod logging;
pub(crate) mod ui;
pub(crate) mod utils;

use crate::app::Session;
use crate::config::{Config, Environment};
use crate::core::signals;
use crate::core::terminal::CrosstermFrontend;
use crate::utils::cli::{CliAction, handle_args};

use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[spy] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let action = handle_args();

    let start = match action {
        CliAction::Exit => return Ok(()),
        CliAction::Fail => std::process::exit(1),
        CliAction::RunApp => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("[spy] Error: cannot determine the current directory: {e}");
                std::process::exit(1);
            }
        },
        CliAction::RunAppAtPath(path_arg) => {
            let target = PathBuf::from(&path_arg);
            if !target.is_dir() {
                eprintln!("\n[spy] Error: Path '{}' cannot be opened.", path_arg);
                std::process::exit(1);
            }
            target
        }
    };

    let env = Environment::from_process();
    let _log_guard = logging::init(env.home());
    let config = Config::load(env.home());

    if let Err(e) = signals::install() {
        eprintln!("[spy] Warning: cannot install signal handlers: {e}");
    }

    let frontend = Box::new(CrosstermFrontend::new()?);
    let mut session = Session::new(config, env, &start, frontend)?.follow_process_cwd();
    let result = session.run();
    session.finish();
    drop(session);

    if let Err(e) = &result {
        tracing::error!(error = %e, "session ended with error");
    }
    result
}
