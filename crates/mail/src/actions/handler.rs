//! Action handler for email operations
//!
//! Translates user-level mutations into label changes on the remote service.

use anyhow::{Result, bail};
use log::info;
use std::sync::Arc;

use crate::MailService;
use crate::compose;
use crate::models::ThreadId;

/// Label IDs used by Gmail for common states
pub mod labels {
    pub const INBOX: &str = "INBOX";
    pub const UNREAD: &str = "UNREAD";
    pub const TRASH: &str = "TRASH";
}

/// Handler for email actions like archive, trash and send.
///
/// Cheap to clone; clones share the same service and can be moved into
/// fetch workers.
#[derive(Clone)]
pub struct ActionHandler {
    service: Arc<dyn MailService>,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(service: Arc<dyn MailService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<dyn MailService> {
        &self.service
    }

    /// Archive a thread (remove from INBOX)
    pub fn archive_thread(&self, thread_id: &ThreadId) -> Result<()> {
        self.service
            .modify_labels(thread_id, &[], &[labels::INBOX])?;
        info!("Archived thread {}", thread_id.as_str());
        Ok(())
    }

    /// Move a thread to trash
    pub fn trash_thread(&self, thread_id: &ThreadId) -> Result<()> {
        self.service
            .modify_labels(thread_id, &[labels::TRASH], &[labels::INBOX])?;
        info!("Trashed thread {}", thread_id.as_str());
        Ok(())
    }

    /// Clear the UNREAD label on every message of a thread
    pub fn mark_read(&self, thread_id: &ThreadId) -> Result<()> {
        self.service
            .modify_labels(thread_id, &[], &[labels::UNREAD])
    }

    /// Send editor output. The `Mode:` directive is stripped first.
    pub fn send(&self, text: &str) -> Result<()> {
        let stripped = compose::strip_mode_header(text);
        let Some((head, _)) = stripped.split_once("\n\n") else {
            bail!("Message has no header block");
        };
        let has_recipient = head
            .lines()
            .any(|l| l.strip_prefix("To:").is_some_and(|to| !to.trim().is_empty()));
        if !has_recipient {
            bail!("Message has no recipient");
        }

        self.service.send_raw(&crate::mime::encode(stripped.as_bytes()))?;
        info!("Sent message ({} bytes)", stripped.len());
        Ok(())
    }
}
