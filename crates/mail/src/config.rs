//! OAuth client credentials
//!
//! Looked up, first match wins, from:
//! 1. `google-credentials.json` in the config directory
//!    (the file Google Cloud Console hands out for installed apps)
//! 2. `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` baked in at compile time
//! 3. `GMAIL_CLIENT_ID` / `GMAIL_CLIENT_SECRET` in the environment

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Credentials filename in the config directory
pub const CREDENTIALS_FILE: &str = "google-credentials.json";

/// OAuth client identity for the Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct CredentialFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
}

#[derive(Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
}

impl From<ClientSection> for GmailCredentials {
    fn from(section: ClientSection) -> Self {
        Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
        }
    }
}

impl GmailCredentials {
    /// Find credentials from the first available source
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            debug!("Loading OAuth credentials from {}", CREDENTIALS_FILE);
            let file: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(file);
        }

        if let Some(creds) = Self::from_compile_time() {
            debug!("Using OAuth credentials embedded at build time");
            return Ok(creds);
        }

        Self::from_env().map_err(|e| {
            anyhow!(
                "{}; place a client secret file at {} or set GMAIL_CLIENT_ID/GMAIL_CLIENT_SECRET",
                e,
                config::config_path(CREDENTIALS_FILE)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| CREDENTIALS_FILE.to_string())
            )
        })
    }

    fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("GOOGLE_CLIENT_ID").filter(|s| !s.is_empty())?;
        let client_secret = option_env!("GOOGLE_CLIENT_SECRET").filter(|s| !s.is_empty())?;
        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Load credentials from a specific client secret file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: CredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(file)
    }

    /// Parse a client secret file's contents
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(file)
    }

    fn from_credential_file(file: CredentialFile) -> Result<Self> {
        file.installed
            .or(file.web)
            .map(Self::from)
            .context("Credentials file missing 'installed' or 'web' section")
    }

    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GMAIL_CLIENT_ID")
            .context("GMAIL_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET")
            .context("GMAIL_CLIENT_SECRET environment variable not set")?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}
