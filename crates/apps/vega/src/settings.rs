//! User settings for Vega
//!
//! Read from `vega.json` in the Cosmos config directory (or a file given with
//! `--config`). Every field has a default, so a missing file or a partial one
//! is fine.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::input::Action;

/// Settings filename in the config directory
pub const SETTINGS_FILE: &str = "vega.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Editor command line; `$EDITOR` takes precedence when set
    pub editor: String,
    /// Subjects matching this already read as replies
    pub reply_regexp: String,
    pub reply_prefix: String,
    /// Appended to every new message and reply
    pub signature: String,
    /// Search query for the thread list
    pub query: String,
    pub max_results: usize,
    /// Key binding overrides: context name -> keystroke -> action.
    /// Context names are `global`, `thread_list`, `thread` and `navigator`.
    pub bindings: BTreeMap<String, BTreeMap<String, Action>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: "/usr/bin/emacs".to_string(),
            reply_regexp: "^(Re|Sv|Aw|AW): ".to_string(),
            reply_prefix: "Re: ".to_string(),
            signature: "Best regards".to_string(),
            query: "in:inbox".to_string(),
            max_results: 20,
            bindings: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load from an explicit file, or from `vega.json` if it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => config::load_json_file(path)
                .with_context(|| format!("Failed to read settings from {}", path.display())),
            None => config::load_json_or_default(SETTINGS_FILE),
        }
    }

    /// Pick the editor: command line flag, then `$EDITOR`, then the setting
    pub fn resolve_editor(&mut self, flag: Option<String>, env: Option<String>) {
        if let Some(editor) = flag.or(env).filter(|e| !e.trim().is_empty()) {
            self.editor = editor;
        }
    }

    pub fn reply_regex(&self) -> Result<Regex> {
        Regex::new(&self.reply_regexp)
            .with_context(|| format!("reply_regexp {:?} is not a valid regex", self.reply_regexp))
    }
}
