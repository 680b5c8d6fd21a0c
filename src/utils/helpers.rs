//! Helpers for spy.
//!
//! - Color parsing from curses-style names, indices or hex codes
//! - Shell-style word expansion for jump targets (`~`, `$VAR`, quotes)
//! - Displaying home directories as "~" in paths
//!
//! These helpers are used throughout spy.

use ratatui::style::Color;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Parses a color name, a 0-255 palette index or a hex value (#RRGGBB or #RGB).
///
/// Returns `None` for anything unrecognised so the config parser can warn about it.
pub fn parse_color(s: &str) -> Option<Color> {
    let color = match s.to_lowercase().as_str() {
        "default" | "reset" | "none" => Color::Reset,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        lower => {
            if let Ok(idx) = lower.parse::<u8>() {
                return Some(Color::Indexed(idx));
            }
            return parse_hex(lower.strip_prefix('#')?);
        }
    };
    Some(color)
}

fn parse_hex(hex: &str) -> Option<Color> {
    let expanded = match hex.len() {
        6 => hex.to_string(),
        3 => hex.chars().map(|c| format!("{c}{c}")).collect(),
        _ => return None,
    };
    let rgb = u32::from_str_radix(&expanded, 16).ok()?;
    Some(Color::Rgb(
        ((rgb >> 16) & 0xFF) as u8,
        ((rgb >> 8) & 0xFF) as u8,
        (rgb & 0xFF) as u8,
    ))
}

pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Util function to shorten the home directory to ~.
/// Used for the header line.
pub fn shorten_home_path(path: &Path, home: Option<&Path>) -> String {
    if let Some(home_dir) = home
        && let Ok(stripped) = path.strip_prefix(home_dir)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~{}{}", MAIN_SEPARATOR, stripped.display());
    }
    path.display().to_string()
}

/// Expands a jump target the way a shell would expand a single word.
///
/// Supports a leading `~` or `~/`, `$VAR` and `${VAR}` (unset variables expand to nothing),
/// single quotes (literal), double quotes (variables still expand) and backslash escapes.
/// Surrounding whitespace is dropped.
pub fn expand_words(input: &str, home: Option<&Path>) -> String {
    expand_words_with(input, home, |name| std::env::var(name).ok())
}

pub fn expand_words_with<F>(input: &str, home: Option<&Path>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let input = input.trim();
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    if let Some(home) = home
        && input.starts_with('~')
        && (input.len() == 1 || input[1..].starts_with('/'))
    {
        chars.next();
        out.push_str(&home.to_string_lossy());
    }

    let mut in_single = false;
    let mut in_double = false;
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if !in_single => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '$' if !in_single => {
                let name = if chars.peek() == Some(&'{') {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    name
                } else {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            name.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    name
                };
                if name.is_empty() {
                    out.push('$');
                } else if let Some(value) = lookup(&name) {
                    out.push_str(&value);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
