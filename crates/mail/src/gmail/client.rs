//! Gmail API HTTP client
//!
//! Implements [`MailService`] on top of the Gmail REST API.
//! Uses synchronous HTTP (ureq) so it can run on plain worker threads.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::time::Duration;

use super::api::{
    GmailMessage, GmailThread, ListLabelsResponse, ListThreadsResponse, ModifyRequest, SendRequest,
};
use super::{GmailAuth, normalize_label, normalize_message, normalize_thread};
use crate::MailService;
use crate::models::{Label, Message, MessageId, Thread, ThreadId, ThreadSummary};

/// Headers requested when fetching threads for the list view
const LIST_HEADERS: &[&str] = &["From", "Subject", "Date"];

/// Gmail API client
pub struct GmailClient {
    auth: GmailAuth,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Attempts for a single message fetch before giving up
    const MAX_RETRIES: u32 = 3;

    /// Create a new Gmail client
    pub fn new(auth: GmailAuth) -> Self {
        Self { auth }
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.get_access_token()?))
    }

    /// Fetch one message, with no retry
    fn fetch_message(&self, id: &MessageId) -> Result<GmailMessage> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .context("Failed to send get message request")?;

        response
            .body_mut()
            .read_json()
            .context("Failed to parse message response")
    }

    /// Get a message with exponential backoff retry
    fn fetch_message_with_retry(&self, id: &MessageId) -> Result<GmailMessage> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(100);

        for attempt in 0..Self::MAX_RETRIES {
            match self.fetch_message(id) {
                Ok(msg) => return Ok(msg),
                Err(e) => {
                    debug!("Get message {} attempt {} failed: {}", id.as_str(), attempt + 1, e);
                    last_error = Some(e);
                    if attempt < Self::MAX_RETRIES - 1 {
                        let jitter = Duration::from_millis(rand_jitter());
                        std::thread::sleep(delay + jitter);
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Get message {} failed", id.as_str())))
    }
}

impl MailService for GmailClient {
    fn list_threads(&self, query: &str, max_results: usize) -> Result<Vec<ThreadSummary>> {
        let url = format!(
            "{}/users/me/threads?maxResults={}&q={}",
            Self::BASE_URL,
            max_results.clamp(1, 500),
            urlencoding::encode(query)
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .context("Failed to send list threads request")?;

        let list: ListThreadsResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list threads response")?;

        debug!(
            "Listed threads for {:?}: estimate {:?}",
            query, list.result_size_estimate
        );

        Ok(list
            .threads
            .unwrap_or_default()
            .into_iter()
            .map(|t| ThreadSummary {
                id: ThreadId::new(t.id),
                snippet: t.snippet,
            })
            .collect())
    }

    fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        let mut url = format!(
            "{}/users/me/threads/{}?format=metadata",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );
        for header in LIST_HEADERS {
            url.push_str(&format!("&metadataHeaders={}", header));
        }

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .with_context(|| format!("Failed to get thread {}", id.as_str()))?;

        let thread: GmailThread = response
            .body_mut()
            .read_json()
            .context("Failed to parse thread response")?;

        Ok(normalize_thread(thread))
    }

    fn get_message(&self, id: &MessageId) -> Result<Message> {
        self.fetch_message_with_retry(id).map(normalize_message)
    }

    fn modify_labels(&self, id: &ThreadId, add: &[&str], remove: &[&str]) -> Result<()> {
        let url = format!(
            "{}/users/me/threads/{}/modify",
            Self::BASE_URL,
            urlencoding::encode(id.as_str())
        );

        ureq::post(&url)
            .header("Authorization", &self.bearer()?)
            .send_json(&ModifyRequest {
                add_label_ids: add,
                remove_label_ids: remove,
            })
            .with_context(|| format!("Failed to modify labels on thread {}", id.as_str()))?;

        Ok(())
    }

    fn send_raw(&self, raw: &str) -> Result<()> {
        let url = format!("{}/users/me/messages/send", Self::BASE_URL);

        ureq::post(&url)
            .header("Authorization", &self.bearer()?)
            .send_json(&SendRequest { raw })
            .context("Failed to send message")?;

        Ok(())
    }

    fn list_labels(&self) -> Result<Vec<Label>> {
        let url = format!("{}/users/me/labels", Self::BASE_URL);

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .context("Failed to send list labels request")?;

        let labels: ListLabelsResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse labels response")?;

        Ok(labels
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(normalize_label)
            .collect())
    }
}

/// Generate a random jitter value (0-100ms)
fn rand_jitter() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    hasher.finish() % 100
}
