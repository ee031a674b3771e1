//! Email actions module
//!
//! Provides high-level action handlers for mutations on threads
//! (archive, trash, mark read) and for sending composed messages.

mod handler;

pub use handler::{ActionHandler, labels};
