//! Built-in configuration, parsed before any user file.
//!
//! Written in the same line language as `.spyrc`, so `spy --defaults > ~/.spyrc` gives a
//! starting point.

pub const DEFAULT_CONFIG: &str = r#"# spy default configuration
#
# map <key> <command> [argument]
# color <glob|-dir|-x|-ro|-link|-tagged> <color>
# ignoremask <glob> [group]
# ignoredefault <group> <0|1>
# set <searchhistory|cwdrecovery> <0|1>

# Motion
map j down
map Down down
map k up
map Up up
map h left
map Left left
map l right
map Right right
map r pagedown
map PageDown pagedown
map t pageup
map PageUp pageup
map Home first
map G last
map End last

# Directories
map d dirdown
map u dirup
map Backspace dirup
map g jump
map ~ jump ~

# Entries
map Enter enter
map v display
map Space tag

# Search
map / search
map n searchnext
map N searchprev

# Commands
map ! execute
map $ shell $SHELL

# View
map D detail
map . toggleignore dot
map C-r refresh
map C-l redraw

map q quit
map C-c quit

# Colors
color -dir yellow
color -x green
color -link cyan
color -ro red
color -tagged magenta

# Ignored by default: dotfiles (toggle with '.') and build leftovers (group 0)
ignoremask .* dot
ignoremask *.o
ignoremask *~
"#;
