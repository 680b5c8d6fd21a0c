//! Miscellaneous utility functions for spy.
//!
//! This module holds the [helpers] submodule, which provides commonly used utilities such as:
//! - Color parsing
//! - Word expansion for jump targets
//! - Shortening the home directory path to "~"
//!
//! and the [cli] submodule for argument handling.

pub mod cli;
pub mod helpers;

pub use helpers::{expand_words, get_home, parse_color, shorten_home_path};
