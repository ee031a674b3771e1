//! Input handling module for keyboard shortcuts
//!
//! Per-view keybindings with a global fallback.

pub mod actions;
pub mod keymap;

pub use actions::Action;
pub use keymap::{Context, Keymap, ShortcutCategory, bindings, keystroke, shortcuts_help};
