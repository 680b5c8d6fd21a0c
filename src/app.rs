//! Application logic for spy.
//!
//! - [session]: the [Session] that owns all state and runs the event loop.
//! - [handlers]: the command handlers bound to keys.
//! - [nav]: current directory, listing and cursor.
//! - [commands] and [keymap]: the command registry and the key table built from config.
//! - [history] and [line_input]: prompt histories and the line editor.

pub mod commands;
pub mod handlers;
pub mod history;
pub mod keymap;
pub mod line_input;
pub mod nav;
pub mod session;

pub use nav::NavigationState;
pub use session::Session;
