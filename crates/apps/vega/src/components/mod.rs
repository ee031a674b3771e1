//! Reusable UI components for Vega

mod shortcuts_help;
mod status_bar;
pub mod thread_list_item;

pub use shortcuts_help::ShortcutsHelp;
pub use status_bar::StatusBar;
pub use thread_list_item::ThreadListItem;
