//! Vega - a terminal Gmail client
//!
//! The binary in `main.rs` wires these modules to a real terminal and the
//! Gmail API; everything here also runs against fakes in tests.

pub mod app;
pub mod components;
pub mod editor;
pub mod input;
pub mod settings;
pub mod terminal;
pub mod views;

pub use app::{App, ViewMode};
pub use settings::Settings;
