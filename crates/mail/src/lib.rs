//! Mail crate - Business logic for the terminal mail client
//!
//! This crate provides UI-free mail functionality:
//! - Domain models (Thread, Message, Label, EmailAddress)
//! - The [`MailService`] capability and its Gmail implementation
//! - OAuth token management
//! - URL-safe MIME payload encoding
//! - Parallel fetch coordination that applies results on the caller's thread
//! - Action handlers for mutations (archive, trash, mark read, send)
//! - Compose and reply helpers

pub mod actions;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod gmail;
pub mod mime;
pub mod models;
pub mod service;

pub use actions::ActionHandler;
pub use config::GmailCredentials;
pub use fetch::{Apply, BatchReport, Parallel, fetch_all, spawn_best_effort};
pub use gmail::{GmailAuth, GmailClient, Scope};
pub use models::{
    BodyPart, EmailAddress, Header, Label, LabelId, Message, MessageBuilder, MessageId, Thread,
    ThreadId, ThreadSummary, label_names, label_sort_order,
};
pub use service::MailService;
