//! Keyboard shortcut definitions and help text
//!
//! Bindings are written as keystroke strings (`"ctrl-n"`, `"pagedown"`,
//! `"x"`) scoped to a view context. Lookup tries the active context first
//! and falls back to the global bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;
use std::collections::BTreeMap;

use super::actions::Action;

/// The view a binding applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    ThreadList,
    Thread,
    Navigator,
}

impl Context {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "thread_list" => Some(Context::ThreadList),
            "thread" => Some(Context::Thread),
            "navigator" => Some(Context::Navigator),
            _ => None,
        }
    }
}

/// A keystroke bound to an action, optionally scoped to one context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keystroke: String,
    pub action: Action,
    /// `None` for global bindings
    pub context: Option<Context>,
}

impl Binding {
    pub fn new(keystroke: &str, action: Action, context: Option<Context>) -> Self {
        Self {
            keystroke: normalize_keystroke(keystroke),
            action,
            context,
        }
    }
}

/// A category of keyboard shortcuts for display in the help overlay
pub struct ShortcutCategory {
    pub name: &'static str,
    pub shortcuts: Vec<Shortcut>,
}

/// A single keyboard shortcut for display
pub struct Shortcut {
    pub keys: &'static str,
    pub description: &'static str,
}

/// Returns the default keybindings
pub fn bindings() -> Vec<Binding> {
    use Action::*;
    use Context::*;

    let list = Some(ThreadList);
    let thread = Some(Thread);
    let nav = Some(Navigator);

    vec![
        // ===== Global =====
        Binding::new("q", Quit, None),
        Binding::new("ctrl-c", Quit, None),
        Binding::new("?", ShowShortcuts, None),
        // ===== Thread list =====
        Binding::new("tab", ToggleDetails, list),
        Binding::new("p", MoveUp, list),
        Binding::new("k", MoveUp, list),
        Binding::new("up", MoveUp, list),
        Binding::new("ctrl-p", MoveUp, list),
        Binding::new("n", MoveDown, list),
        Binding::new("j", MoveDown, list),
        Binding::new("down", MoveDown, list),
        Binding::new("ctrl-n", MoveDown, list),
        Binding::new("r", Refresh, list),
        Binding::new("ctrl-r", Refresh, list),
        Binding::new("x", ToggleMark, list),
        Binding::new("enter", OpenSelected, list),
        Binding::new(">", OpenSelected, list),
        Binding::new("right", OpenSelected, list),
        Binding::new("d", Trash, list),
        Binding::new("a", Archive, list),
        Binding::new("e", Archive, list),
        Binding::new("c", Compose, list),
        Binding::new("o", ComposeFromFile, list),
        // ===== Open thread =====
        Binding::new("<", GoBack, thread),
        Binding::new("left", GoBack, thread),
        Binding::new("u", GoBack, thread),
        Binding::new("escape", GoBack, thread),
        Binding::new("p", ScrollUp, thread),
        Binding::new("k", ScrollUp, thread),
        Binding::new("up", ScrollUp, thread),
        Binding::new("n", ScrollDown, thread),
        Binding::new("j", ScrollDown, thread),
        Binding::new("down", ScrollDown, thread),
        Binding::new("ctrl-p", PrevThread, thread),
        Binding::new("ctrl-n", NextThread, thread),
        Binding::new("space", PageDown, thread),
        Binding::new("pagedown", PageDown, thread),
        Binding::new("backspace", PageUp, thread),
        Binding::new("pageup", PageUp, thread),
        Binding::new("x", MarkAndNext, thread),
        Binding::new("r", Reply, thread),
        Binding::new("e", Archive, thread),
        Binding::new("s", SaveMessage, thread),
        // ===== File dialogs =====
        Binding::new("p", MoveUp, nav),
        Binding::new("up", MoveUp, nav),
        Binding::new("ctrl-p", MoveUp, nav),
        Binding::new("n", MoveDown, nav),
        Binding::new("down", MoveDown, nav),
        Binding::new("ctrl-n", MoveDown, nav),
        Binding::new("enter", OpenSelected, nav),
        Binding::new("tab", ToggleFilenameEdit, nav),
        Binding::new("q", Cancel, nav),
        Binding::new("escape", Cancel, nav),
        Binding::new("ctrl-c", Cancel, nav),
        Binding::new("ctrl-g", Cancel, nav),
    ]
}

/// Default bindings plus user overrides, resolved per context
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: bindings(),
        }
    }
}

impl Keymap {
    /// Build the keymap, applying overrides keyed by context name
    /// (`global`, `thread_list`, `thread`, `navigator`)
    pub fn with_overrides(overrides: &BTreeMap<String, BTreeMap<String, Action>>) -> Self {
        let mut keymap = Self::default();
        for (context_name, keys) in overrides {
            let context = match context_name.as_str() {
                "global" => None,
                name => match Context::from_name(name) {
                    Some(context) => Some(context),
                    None => {
                        warn!("Ignoring bindings for unknown context {:?}", name);
                        continue;
                    }
                },
            };
            for (keystroke, action) in keys {
                keymap
                    .bindings
                    .push(Binding::new(keystroke, *action, context));
            }
        }
        keymap
    }

    /// Find the action for a key: context bindings first, then global.
    /// Later bindings win over earlier ones.
    pub fn resolve(&self, context: Context, key: &KeyEvent) -> Option<Action> {
        let stroke = keystroke(key);
        let find = |ctx: Option<Context>| {
            self.bindings
                .iter()
                .rev()
                .find(|b| b.context == ctx && b.keystroke == stroke)
                .map(|b| b.action)
        };
        find(Some(context)).or_else(|| find(None))
    }
}

/// Render a key event as a keystroke string
pub fn keystroke(key: &KeyEvent) -> String {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) if ctrl => c.to_ascii_lowercase().to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Esc => "escape".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => "unknown".to_string(),
    };

    let mut stroke = String::new();
    if ctrl {
        stroke.push_str("ctrl-");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        stroke.push_str("alt-");
    }
    stroke.push_str(&name);
    stroke
}

/// Lowercase modifiers and key names. Single characters keep their case
/// unless combined with ctrl, matching what [`keystroke`] produces.
fn normalize_keystroke(stroke: &str) -> String {
    let stroke = stroke.trim();
    if stroke.chars().count() == 1 {
        return stroke.to_string();
    }
    match stroke.rsplit_once('-') {
        Some((mods, key)) if !key.is_empty() => {
            let mods = mods.to_lowercase();
            let key = if key.chars().count() == 1 && !mods.contains("ctrl") {
                key.to_string()
            } else {
                key.to_lowercase()
            };
            format!("{}-{}", mods, key)
        }
        _ => stroke.to_lowercase(),
    }
}

/// Returns categorized shortcuts for the help overlay
pub fn shortcuts_help() -> Vec<ShortcutCategory> {
    vec![
        ShortcutCategory {
            name: "Thread list",
            shortcuts: vec![
                Shortcut {
                    keys: "n, j, Down, ^N",
                    description: "Next thread",
                },
                Shortcut {
                    keys: "p, k, Up, ^P",
                    description: "Previous thread",
                },
                Shortcut {
                    keys: "Enter, >, Right",
                    description: "Open thread",
                },
                Shortcut {
                    keys: "Tab",
                    description: "Toggle snippet",
                },
                Shortcut {
                    keys: "x",
                    description: "Mark thread",
                },
                Shortcut {
                    keys: "a, e",
                    description: "Archive marked",
                },
                Shortcut {
                    keys: "d",
                    description: "Trash marked",
                },
                Shortcut {
                    keys: "r, ^R",
                    description: "Refresh",
                },
                Shortcut {
                    keys: "c",
                    description: "Compose",
                },
                Shortcut {
                    keys: "o",
                    description: "Compose from file",
                },
            ],
        },
        ShortcutCategory {
            name: "Open thread",
            shortcuts: vec![
                Shortcut {
                    keys: "<, Left, u",
                    description: "Back to list",
                },
                Shortcut {
                    keys: "n, j / p, k",
                    description: "Scroll down / up",
                },
                Shortcut {
                    keys: "Space / Backspace",
                    description: "Page down / up",
                },
                Shortcut {
                    keys: "^N / ^P",
                    description: "Next / previous thread",
                },
                Shortcut {
                    keys: "x",
                    description: "Mark and go to next",
                },
                Shortcut {
                    keys: "r",
                    description: "Reply to last message",
                },
                Shortcut {
                    keys: "e",
                    description: "Archive",
                },
                Shortcut {
                    keys: "s",
                    description: "Save last message",
                },
            ],
        },
        ShortcutCategory {
            name: "File dialogs",
            shortcuts: vec![
                Shortcut {
                    keys: "n, ^N / p, ^P",
                    description: "Next / previous entry",
                },
                Shortcut {
                    keys: "Enter",
                    description: "Choose",
                },
                Shortcut {
                    keys: "Tab",
                    description: "Edit file name",
                },
                Shortcut {
                    keys: "q, Esc, ^C, ^G",
                    description: "Cancel",
                },
            ],
        },
        ShortcutCategory {
            name: "Global",
            shortcuts: vec![
                Shortcut {
                    keys: "?",
                    description: "Show this help",
                },
                Shortcut {
                    keys: "q, ^C",
                    description: "Quit",
                },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_keystroke_names() {
        assert_eq!(keystroke(&key(KeyCode::Char('x'))), "x");
        assert_eq!(keystroke(&key(KeyCode::Char(' '))), "space");
        assert_eq!(keystroke(&ctrl('n')), "ctrl-n");
        assert_eq!(keystroke(&key(KeyCode::PageDown)), "pagedown");
        assert_eq!(
            keystroke(&KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            "?"
        );
    }

    #[test]
    fn test_same_key_differs_by_context() {
        let keymap = Keymap::default();
        let n = key(KeyCode::Char('n'));
        assert_eq!(keymap.resolve(Context::ThreadList, &n), Some(Action::MoveDown));
        assert_eq!(keymap.resolve(Context::Thread, &n), Some(Action::ScrollDown));

        let r = key(KeyCode::Char('r'));
        assert_eq!(keymap.resolve(Context::ThreadList, &r), Some(Action::Refresh));
        assert_eq!(keymap.resolve(Context::Thread, &r), Some(Action::Reply));
    }

    #[test]
    fn test_global_fallback() {
        let keymap = Keymap::default();
        let q = key(KeyCode::Char('q'));
        assert_eq!(keymap.resolve(Context::Thread, &q), Some(Action::Quit));
        // The navigator shadows q with cancel
        assert_eq!(keymap.resolve(Context::Navigator, &q), Some(Action::Cancel));
        assert_eq!(keymap.resolve(Context::ThreadList, &key(KeyCode::Char('Z'))), None);
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "thread_list".to_string(),
            BTreeMap::from([("D".to_string(), Action::Trash), ("d".to_string(), Action::Archive)]),
        );
        overrides.insert(
            "global".to_string(),
            BTreeMap::from([("Ctrl-Q".to_string(), Action::Quit)]),
        );
        overrides.insert(
            "sidebar".to_string(),
            BTreeMap::from([("x".to_string(), Action::Quit)]),
        );

        let keymap = Keymap::with_overrides(&overrides);
        assert_eq!(
            keymap.resolve(Context::ThreadList, &key(KeyCode::Char('d'))),
            Some(Action::Archive)
        );
        assert_eq!(
            keymap.resolve(Context::ThreadList, &key(KeyCode::Char('D'))),
            Some(Action::Trash)
        );
        assert_eq!(keymap.resolve(Context::Thread, &ctrl('q')), Some(Action::Quit));
        assert_eq!(
            keymap.resolve(Context::ThreadList, &key(KeyCode::Char('x'))),
            Some(Action::ToggleMark)
        );
    }

    #[test]
    fn test_normalize_keystroke() {
        assert_eq!(normalize_keystroke("X"), "X");
        assert_eq!(normalize_keystroke("Ctrl-N"), "ctrl-n");
        assert_eq!(normalize_keystroke("alt-X"), "alt-X");
        assert_eq!(normalize_keystroke("PageDown"), "pagedown");
        assert_eq!(normalize_keystroke("ctrl-PageUp"), "ctrl-pageup");
    }
}
