//! Gmail API response normalization
//!
//! Converts Gmail API responses to domain models.

use super::api::{GmailLabel, GmailMessage, GmailThread, MessagePart};
use crate::models::{BodyPart, Header, Label, Message, MessageId, Thread, ThreadId};

/// Normalize a Gmail API message
pub fn normalize_message(gmail_msg: GmailMessage) -> Message {
    let mut headers = Vec::new();
    let mut parts = Vec::new();

    if let Some(payload) = &gmail_msg.payload {
        if let Some(raw_headers) = &payload.headers {
            headers = raw_headers
                .iter()
                .map(|h| Header {
                    name: h.name.clone(),
                    value: h.value.clone(),
                })
                .collect();
        }
        collect_parts(payload, &mut parts);
    }

    // Internal date is milliseconds since epoch, sent as a string
    let internal_date = gmail_msg
        .internal_date
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);

    Message {
        id: MessageId::new(gmail_msg.id),
        thread_id: ThreadId::new(gmail_msg.thread_id),
        label_ids: gmail_msg.label_ids.unwrap_or_default(),
        headers,
        parts,
        snippet: decode_html_entities(&gmail_msg.snippet),
        internal_date,
    }
}

/// Normalize a Gmail API thread, keeping message order
pub fn normalize_thread(gmail_thread: GmailThread) -> Thread {
    let messages = gmail_thread
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(normalize_message)
        .collect();
    Thread::new(ThreadId::new(gmail_thread.id), messages)
}

pub fn normalize_label(label: GmailLabel) -> Label {
    if label.label_type.as_deref() == Some("system") {
        Label::system(label.id, label.name)
    } else {
        Label::new(label.id, label.name)
    }
}

/// Depth-first walk collecting every leaf part that carries inline data
fn collect_parts(part: &MessagePart, out: &mut Vec<BodyPart>) {
    if let Some(children) = &part.parts
        && !children.is_empty()
    {
        for child in children {
            collect_parts(child, out);
        }
        return;
    }

    if let Some(body) = &part.body
        && let Some(data) = &body.data
    {
        out.push(BodyPart {
            mime_type: part.mime_type.clone().unwrap_or_default(),
            data: data.clone(),
        });
    }
}

/// Decode HTML entities in snippet text
fn decode_html_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
