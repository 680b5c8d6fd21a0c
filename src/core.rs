//! Core runtime logic for spy.
//!
//! This module contains the non-UI "engine" pieces used by the application:
//! - [entry]: one directory member with lazily fetched attributes and the natural name order.
//! - [listing]: reading, filtering and sorting a directory.
//! - [layout]: the paged column-major grid and its index mapping.
//! - [search]: the incremental regex search.
//! - [formatter]: size, time and name formatting for display.
//! - [proc]: running shell commands and recovering their working directory.
//! - [terminal]: the [Frontend](terminal::Frontend) seam and its crossterm implementation.
//!
//! Most callers will import [FileEntry] and [DirectoryListing] from this module.

pub mod entry;
pub mod formatter;
pub mod layout;
pub mod listing;
pub mod proc;
pub mod search;
pub(crate) mod signals;
pub mod terminal;

pub use entry::{EntryAttrs, FileEntry, natural_cmp};
pub use layout::{GridLayout, GridPos, Viewport};
pub use listing::{DetailMode, DirectoryListing};
pub use search::SearchEngine;
