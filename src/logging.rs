//! Logging setup for spy.
//!
//! The terminal belongs to the UI, so log output goes to `~/.spy.log` through a non-blocking
//! appender. Nothing is installed unless `SPY_LOG` is set; its value is the filter directive.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use std::path::Path;

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "SPY_LOG";
/// Log file name, created in the home directory.
pub const LOG_FILE_NAME: &str = ".spy.log";

/// Installs the global subscriber when `SPY_LOG` is set.
///
/// The returned guard flushes pending lines on drop and must live until the end of `main`.
pub fn init(home: Option<&Path>) -> Option<WorkerGuard> {
    let directive = std::env::var(LOG_ENV_VAR).ok()?;
    let dir = home?;

    let filter = match EnvFilter::try_new(&directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("[spy] Warning: invalid {LOG_ENV_VAR} '{directive}': {e}");
            EnvFilter::new("info")
        }
    };

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        return None;
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Some(guard)
}
