//! Label model representing a Gmail label/folder

use serde::{Deserialize, Serialize};

/// Unique identifier for a label (Gmail label ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub String);

impl LabelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Well-known Gmail system labels
    pub const INBOX: &'static str = "INBOX";
    pub const SENT: &'static str = "SENT";
    pub const DRAFTS: &'static str = "DRAFT";
    pub const TRASH: &'static str = "TRASH";
    pub const SPAM: &'static str = "SPAM";
    pub const STARRED: &'static str = "STARRED";
    pub const IMPORTANT: &'static str = "IMPORTANT";
    pub const UNREAD: &'static str = "UNREAD";
}

impl From<String> for LabelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A mail label (folder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label ID (e.g., "INBOX", "SENT", "Label_123")
    pub id: LabelId,
    /// Display name
    pub name: String,
    /// Whether this is a system label
    pub is_system: bool,
}

impl Label {
    /// Create a user label
    pub fn new(id: impl Into<LabelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system: false,
        }
    }

    /// Create a system label
    pub fn system(id: impl Into<LabelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_system: true,
        }
    }
}

/// Get the display order for system labels
pub fn label_sort_order(label_id: &str) -> u32 {
    match label_id {
        LabelId::INBOX => 0,
        LabelId::STARRED => 1,
        LabelId::IMPORTANT => 2,
        LabelId::SENT => 3,
        LabelId::DRAFTS => 4,
        LabelId::SPAM => 6,
        LabelId::TRASH => 7,
        _ => 100, // User labels come after system labels
    }
}

/// Resolve label IDs to display names, system labels first.
///
/// IDs with no known label are shown as-is. `UNREAD` is dropped since the
/// list already shows it as an indicator.
pub fn label_names(label_ids: &[String], labels: &[Label]) -> Vec<String> {
    let mut ids: Vec<&String> = label_ids
        .iter()
        .filter(|id| id.as_str() != LabelId::UNREAD)
        .collect();
    ids.sort_by_key(|id| label_sort_order(id));

    ids.into_iter()
        .map(|id| {
            labels
                .iter()
                .find(|l| l.id.as_str() == id.as_str())
                .map(|l| l.name.clone())
                .unwrap_or_else(|| id.clone())
        })
        .collect()
}
