//! Terminal views for Vega

pub mod file_dialog;
mod thread;
mod thread_list;

pub use file_dialog::{FileNavigator, NavigatorKind, NavigatorOutcome};
pub use thread::ThreadView;
pub use thread_list::{ListEntry, ListModel, render_thread_list};
