//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 token management
//! - Gmail API client implementing [`crate::MailService`]
//! - Response normalization to domain models

mod auth;
mod client;
mod normalize;

pub use auth::{GmailAuth, Scope};
pub use client::GmailClient;
pub use normalize::{normalize_label, normalize_message, normalize_thread};

/// Gmail API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing threads
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListThreadsResponse {
        pub threads: Option<Vec<ThreadRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a thread (ID and latest snippet)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ThreadRef {
        pub id: String,
        #[serde(default)]
        pub snippet: String,
    }

    /// A thread with its messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailThread {
        pub id: String,
        pub messages: Option<Vec<GmailMessage>>,
    }

    /// Message from Gmail API (full or metadata format)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub thread_id: String,
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: String,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Message body (base64url encoded)
    #[derive(Debug, Deserialize)]
    pub struct MessageBody {
        pub size: Option<u32>,
        pub data: Option<String>,
    }

    /// Message part; the payload itself is the root part
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Response from listing labels
    #[derive(Debug, Deserialize)]
    pub struct ListLabelsResponse {
        pub labels: Option<Vec<GmailLabel>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GmailLabel {
        pub id: String,
        pub name: String,
        #[serde(rename = "type")]
        pub label_type: Option<String>,
    }

    /// Body of a threads.modify request
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ModifyRequest<'a> {
        pub add_label_ids: &'a [&'a str],
        pub remove_label_ids: &'a [&'a str],
    }

    /// Body of a messages.send request
    #[derive(Debug, Serialize)]
    pub struct SendRequest<'a> {
        pub raw: &'a str,
    }
}
