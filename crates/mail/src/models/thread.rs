//! Thread model representing a Gmail thread (conversation)

use super::{Message, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a thread (Gmail thread ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One row of a thread listing, before the thread itself is fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub snippet: String,
}

/// A conversation: its messages in chronological order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    /// Gmail thread ID
    pub id: ThreadId,
    pub messages: Vec<Message>,
}

impl Thread {
    pub fn new(id: ThreadId, messages: Vec<Message>) -> Self {
        Self { id, messages }
    }

    /// Subject of the first message
    pub fn subject(&self) -> &str {
        self.messages.first().map(|m| m.subject()).unwrap_or_default()
    }

    /// The most recent message, if any
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Date of the most recent message
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.latest().and_then(|m| m.date())
    }

    /// Snippet of the most recent message
    pub fn snippet(&self) -> &str {
        self.latest().map(|m| m.snippet.as_str()).unwrap_or_default()
    }

    /// Whether any message in the thread still carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        self.messages.iter().any(|m| m.has_label(label))
    }

    pub fn is_unread(&self) -> bool {
        self.messages.iter().any(|m| m.is_unread())
    }

    pub fn message_ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id.clone()).collect()
    }

    /// Union of the labels of all messages, in first-seen order
    pub fn label_ids(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for label in self.messages.iter().flat_map(|m| m.label_ids.iter()) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }
}
