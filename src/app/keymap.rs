//! Key bindings for spy.
//!
//! Maps a [Key] to a bound [Command]. The table is filled by the config parser, default
//! configuration first, so later `map` lines for the same key replace earlier ones.

use crate::app::commands::Command;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use phf::phf_map;
use std::collections::HashMap;

/// Key + modifiers as used in bindings.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Key {
    pub const fn plain(code: KeyCode) -> Self {
        Key {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn ctrl(c: char) -> Self {
        Key {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }
}

impl From<KeyEvent> for Key {
    fn from(key: KeyEvent) -> Self {
        Key {
            code: key.code,
            modifiers: key.modifiers,
        }
    }
}

/// Named keys, looked up lowercased. Includes the curses names older configs use.
static KEY_NAMES: phf::Map<&'static str, KeyCode> = phf_map! {
    "enter" => KeyCode::Enter,
    "return" => KeyCode::Enter,
    "space" => KeyCode::Char(' '),
    "spc" => KeyCode::Char(' '),
    "tab" => KeyCode::Tab,
    "backtab" => KeyCode::BackTab,
    "esc" => KeyCode::Esc,
    "escape" => KeyCode::Esc,
    "backspace" => KeyCode::Backspace,
    "bs" => KeyCode::Backspace,
    "up" => KeyCode::Up,
    "down" => KeyCode::Down,
    "left" => KeyCode::Left,
    "right" => KeyCode::Right,
    "home" => KeyCode::Home,
    "end" => KeyCode::End,
    "pageup" => KeyCode::PageUp,
    "pgup" => KeyCode::PageUp,
    "pagedown" => KeyCode::PageDown,
    "pgdn" => KeyCode::PageDown,
    "insert" => KeyCode::Insert,
    "delete" => KeyCode::Delete,
    "del" => KeyCode::Delete,
    "key_up" => KeyCode::Up,
    "key_down" => KeyCode::Down,
    "key_left" => KeyCode::Left,
    "key_right" => KeyCode::Right,
    "key_home" => KeyCode::Home,
    "key_end" => KeyCode::End,
    "key_npage" => KeyCode::PageDown,
    "key_ppage" => KeyCode::PageUp,
    "key_enter" => KeyCode::Enter,
    "key_backspace" => KeyCode::Backspace,
    "key_dc" => KeyCode::Delete,
    "key_ic" => KeyCode::Insert,
    "key_btab" => KeyCode::BackTab,
};

/// Parses a key name from a `map` directive.
///
/// Accepts a single character, a name from the key table, `F1`..`F24`, `^x`, and modifier
/// prefixes `C-`/`Ctrl-`, `M-`/`Alt-`, `S-`/`Shift-` in front of any of those.
pub fn parse_key(s: &str) -> Option<Key> {
    let mut modifiers = KeyModifiers::NONE;
    let mut rest = s;

    if let Some(c) = rest.strip_prefix('^')
        && c.chars().count() == 1
    {
        modifiers |= KeyModifiers::CONTROL;
        rest = c;
    }

    loop {
        let Some((prefix, tail)) = rest.split_once('-') else {
            break;
        };
        if tail.is_empty() {
            break;
        }
        match prefix.to_ascii_lowercase().as_str() {
            "c" | "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "m" | "a" | "alt" | "meta" => modifiers |= KeyModifiers::ALT,
            "s" | "shift" => modifiers |= KeyModifiers::SHIFT,
            _ => break,
        }
        rest = tail;
    }

    let mut chars = rest.chars();
    let code = match (chars.next(), chars.next()) {
        (Some(c), None) => {
            if modifiers.contains(KeyModifiers::CONTROL) {
                KeyCode::Char(c.to_ascii_lowercase())
            } else if modifiers.contains(KeyModifiers::SHIFT) {
                modifiers -= KeyModifiers::SHIFT;
                KeyCode::Char(c.to_ascii_uppercase())
            } else {
                KeyCode::Char(c)
            }
        }
        (None, _) => return None,
        _ => {
            let lower = rest.to_ascii_lowercase();
            if let Some(code) = KEY_NAMES.get(lower.as_str()) {
                *code
            } else {
                let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
                if !(1..=24).contains(&n) {
                    return None;
                }
                KeyCode::F(n)
            }
        }
    };

    Some(Key { code, modifiers })
}

/// Key to command table.
#[derive(Debug, Default)]
pub struct KeyBindingTable {
    map: HashMap<Key, Command>,
}

impl KeyBindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a binding, replacing any earlier one for the same key.
    pub fn bind(&mut self, key: Key, command: Command) {
        self.map.insert(key, command);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Command> {
        self.map.get(key)
    }

    /// Looks up the command for a key event.
    ///
    /// Terminals report shifted characters with SHIFT set; a miss is retried without it so a
    /// binding for `G` matches.
    pub fn lookup(&self, key: KeyEvent) -> Option<&Command> {
        let k = Key::from(key);
        if let Some(command) = self.map.get(&k) {
            return Some(command);
        }

        if matches!(key.code, KeyCode::Char(_)) && key.modifiers.contains(KeyModifiers::SHIFT) {
            let k2 = Key {
                code: key.code,
                modifiers: key.modifiers - KeyModifiers::SHIFT,
            };
            return self.map.get(&k2);
        }
        None
    }
}
