//! Remote mail service trait

use anyhow::Result;

use crate::models::{Label, Message, MessageId, Thread, ThreadId, ThreadSummary};

/// The operations the client needs from the remote mail service.
///
/// Implementations are shared across fetch workers, so every method takes
/// `&self` and the trait requires `Send + Sync`.
pub trait MailService: Send + Sync {
    /// List threads matching a search query, newest first
    fn list_threads(&self, query: &str, max_results: usize) -> Result<Vec<ThreadSummary>>;

    /// Get a thread with header-level detail for each message
    fn get_thread(&self, id: &ThreadId) -> Result<Thread>;

    /// Get one message with its full body
    fn get_message(&self, id: &MessageId) -> Result<Message>;

    /// Add and remove labels on every message of a thread
    fn modify_labels(&self, id: &ThreadId, add: &[&str], remove: &[&str]) -> Result<()>;

    /// Send an RFC 822 message, already encoded with [`crate::mime::encode`]
    fn send_raw(&self, raw: &str) -> Result<()>;

    /// List all labels in the mailbox
    fn list_labels(&self) -> Result<Vec<Label>>;
}
