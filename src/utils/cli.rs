//! Command-line argument parsing and help for spy.
//!
//! When invoked with no args (spy), spy browses the current directory.

use crate::config::defaults::DEFAULT_CONFIG;
use crate::config::load::{CONFIG_FILE_NAME, write_default_config};
use crate::utils::get_home;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CliAction {
    RunApp,
    RunAppAtPath(String),
    Exit,
    /// Bad usage, already reported. The process should exit with a failure status.
    Fail,
}

pub(crate) fn handle_args() -> CliAction {
    let args: Vec<String> = std::env::args().skip(1).collect();
    parse_args(&args)
}

fn parse_args(args: &[String]) -> CliAction {
    let Some(first) = args.first() else {
        return CliAction::RunApp;
    };

    if args.len() > 1 {
        eprintln!("Error: spy accepts only one argument at a time.");
        eprintln!("Usage: spy [PATH] or spy [OPTION]");
        return CliAction::Fail;
    }

    match first.as_str() {
        "--version" | "-v" => {
            print_version();
            CliAction::Exit
        }
        "-h" | "--help" => {
            print_help();
            CliAction::Exit
        }
        "--defaults" => {
            print!("{DEFAULT_CONFIG}");
            CliAction::Exit
        }
        "--init" => init_config(),
        arg if !arg.starts_with('-') && !arg.trim().is_empty() => {
            CliAction::RunAppAtPath(arg.to_string())
        }
        arg => {
            eprintln!("Unknown argument: {}", arg);
            eprintln!("Try --help for available options");
            CliAction::Fail
        }
    }
}

/// Writes the built-in configuration to `~/.spyrc`.
fn init_config() -> CliAction {
    let Some(home) = get_home() else {
        eprintln!("[spy] Error: cannot determine the home directory");
        return CliAction::Fail;
    };
    let path = home.join(CONFIG_FILE_NAME);
    match write_default_config(&path) {
        Ok(()) => {
            println!("Default config written to {}", path.display());
            CliAction::Exit
        }
        Err(e) => {
            eprintln!("[spy] Error: {e}");
            CliAction::Fail
        }
    }
}

fn print_version() {
    println!("spy {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!(
        r#"spy - a keyboard-driven terminal directory browser

USAGE:
  spy [PATH]

PATH:
  Directory to open (defaults to current directory)

OPTIONS:
      --defaults          Print the built-in configuration
      --init              Write the built-in configuration to ~/.spyrc
  -h, --help              Print help information
  -v, --version           Display the current installed version of spy

FILES:
  ./.spyrc, ~/.spyrc      Configuration (first one found is read)
  ~/.spy_jumps            Jump history
  ~/.spy_history          Command history
  ~/.spy_searches         Search history (with "set searchhistory 1")

ENVIRONMENT:
  SPY_CONFIG              Override the user config path
  SPY_LOG                 Log filter (e.g. "debug"), written to ~/.spy.log
  SHELL, EDITOR, PAGER    Programs used to run commands and open entries
"#
    );
}
