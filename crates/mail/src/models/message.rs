//! Message model representing a Gmail message

use super::{LabelId, ThreadId};
use crate::mime;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,
    /// Email address (e.g., "john@example.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like "John Doe <john@example.com>"
    ///
    /// Quotes around the display name are dropped.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim().trim_matches('"').trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Name to show in narrow columns: the display name, else the address
    pub fn short_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Format the email address for display
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// A single header line (name/value), in the order the server returned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// One leaf body part: its MIME type and the still-encoded payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyPart {
    pub mime_type: String,
    /// URL-safe base64 payload as delivered by the API
    pub data: String,
}

/// A single email message, as fetched. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Gmail message ID
    pub id: MessageId,
    /// ID of the thread this message belongs to
    pub thread_id: ThreadId,
    /// Gmail label IDs (e.g., "INBOX", "SENT", "UNREAD")
    pub label_ids: Vec<String>,
    pub headers: Vec<Header>,
    /// Leaf parts in document order; the top-level body counts as a part
    pub parts: Vec<BodyPart>,
    pub snippet: String,
    /// Gmail's internal timestamp (milliseconds since epoch)
    pub internal_date: i64,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: MessageId, thread_id: ThreadId) -> MessageBuilder {
        MessageBuilder::new(id, thread_id)
    }

    /// Look up a header value. Names are case-sensitive; the first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label_ids.iter().any(|l| l == label)
    }

    pub fn is_unread(&self) -> bool {
        self.has_label(LabelId::UNREAD)
    }

    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or_default()
    }

    pub fn sender(&self) -> EmailAddress {
        EmailAddress::parse(self.header("From").unwrap_or_default())
    }

    /// When the message was sent: the Date header, else Gmail's internal date
    pub fn date(&self) -> Option<DateTime<Utc>> {
        if let Some(date) = self.header("Date").and_then(parse_date) {
            return Some(date);
        }
        if self.internal_date > 0 {
            return Utc.timestamp_millis_opt(self.internal_date).single();
        }
        None
    }

    /// Decoded plain-text body.
    ///
    /// Single-part messages decode their only part regardless of type;
    /// multipart messages use the first `text/plain` part.
    pub fn body_text(&self) -> String {
        let part = match self.parts.as_slice() {
            [] => return String::new(),
            [only] => Some(only),
            parts => parts
                .iter()
                .find(|p| p.mime_type.starts_with("text/plain")),
        };

        match part {
            Some(part) => match mime::decode_to_string(&part.data) {
                Ok(text) => text,
                Err(e) => format!("(content error: {})", e),
            },
            None => "(no text/plain part in this message)".to_string(),
        }
    }
}

/// Parse an RFC 2822 date as found in the Date header.
///
/// Trailing comments such as `(UTC)` or `(PST)` are ignored.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let s = match s.find('(') {
        Some(idx) => s[..idx].trim_end(),
        None => s,
    };
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    thread_id: ThreadId,
    label_ids: Vec<String>,
    headers: Vec<Header>,
    parts: Vec<BodyPart>,
    snippet: String,
    internal_date: i64,
}

impl MessageBuilder {
    fn new(id: MessageId, thread_id: ThreadId) -> Self {
        Self {
            id,
            thread_id,
            label_ids: Vec::new(),
            headers: Vec::new(),
            parts: Vec::new(),
            snippet: String::new(),
            internal_date: 0,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn part(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.parts.push(BodyPart {
            mime_type: mime_type.into(),
            data: data.into(),
        });
        self
    }

    /// Add a part from plain text, encoding it the way the API would deliver it
    pub fn text_part(self, mime_type: impl Into<String>, text: &str) -> Self {
        let data = mime::encode(text.as_bytes());
        self.part(mime_type, data)
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn internal_date(mut self, internal_date: i64) -> Self {
        self.internal_date = internal_date;
        self
    }

    pub fn label_ids(mut self, label_ids: Vec<String>) -> Self {
        self.label_ids = label_ids;
        self
    }

    pub fn build(self) -> Message {
        Message {
            id: self.id,
            thread_id: self.thread_id,
            label_ids: self.label_ids,
            headers: self.headers,
            parts: self.parts,
            snippet: self.snippet,
            internal_date: self.internal_date,
        }
    }
}
