//! Action definitions for keyboard shortcuts
//!
//! Actions are organized by the context where they apply. Names are the
//! snake_case strings used in the `bindings` section of the settings file.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Navigation (thread list and file dialogs)
    MoveUp,
    MoveDown,
    OpenSelected,

    // Thread list
    ToggleDetails,
    ToggleMark,
    Refresh,
    Archive,
    Trash,
    Compose,
    ComposeFromFile,

    // Open thread
    GoBack,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    PrevThread,
    NextThread,
    MarkAndNext,
    Reply,
    SaveMessage,

    // File dialogs
    Cancel,
    ToggleFilenameEdit,

    // Global
    ShowShortcuts,
    Quit,
}
