//! Terminal UI for spy.
//!
//! - [render]: the top-level [render] entry point drawing header, page line and prompt line.
//! - [panes]: the paged entry grid.
//!
//! Rendering is pure: it reads a [Screen] snapshot and never touches session state.

pub mod panes;
pub mod render;

pub use render::render;

use crate::app::NavigationState;
use crate::config::ColorRules;
use crate::core::SearchEngine;

/// Bottom line of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottomLine<'a> {
    Empty,
    Status(&'a str),
    /// A prompt being edited. `cursor` is in terminal cells from the start of `text`.
    Prompt {
        prompt: &'a str,
        text: &'a str,
        cursor: usize,
    },
}

/// Everything one frame needs.
pub struct Screen<'a> {
    /// `user@host`.
    pub title: &'a str,
    /// Current directory as shown, home shortened to `~`.
    pub cwd: &'a str,
    pub nav: &'a NavigationState,
    pub colors: &'a ColorRules,
    /// Engine used for the underline, the preview engine while a search prompt is open.
    pub search: &'a SearchEngine,
    pub bottom: BottomLine<'a>,
}
