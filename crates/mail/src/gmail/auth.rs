//! Gmail OAuth2 authentication
//!
//! Tokens are obtained once, interactively, with [`GmailAuth::configure`]
//! (authorization code flow with a local callback server) and stored in the
//! config directory. At runtime [`GmailAuth::get_access_token`] only ever
//! reuses or silently refreshes the stored token: the terminal UI owns the
//! screen, so it must never fall back to a browser flow.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Mutex;

/// Seconds before expiry at which a token is treated as stale
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Permission level requested from Google
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Read plus label changes and sending
    Modify,
    Readonly,
}

impl Scope {
    fn url(self) -> &'static str {
        match self {
            Scope::Modify => "https://www.googleapis.com/auth/gmail.modify",
            Scope::Readonly => "https://www.googleapis.com/auth/gmail.readonly",
        }
    }
}

/// OAuth2 configuration and token management for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    scope: Scope,
    token_path: PathBuf,
    cached: Mutex<Option<StoredToken>>,
}

/// Stored token data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

impl StoredToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at > now + EXPIRY_MARGIN_SECS)
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl GmailAuth {
    /// Gmail API OAuth2 endpoints
    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Port range to try for local OAuth callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Create a new GmailAuth storing tokens at the default location
    pub fn new(client_id: String, client_secret: String, scope: Scope) -> Result<Self> {
        let token_path = config::config_path("gmail-tokens.json")
            .context("Could not determine config directory")?;
        Ok(Self::with_token_path(client_id, client_secret, scope, token_path))
    }

    pub fn with_token_path(
        client_id: String,
        client_secret: String,
        scope: Scope,
        token_path: PathBuf,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            scope,
            token_path,
            cached: Mutex::new(None),
        }
    }

    /// Get a valid access token, refreshing the stored one if needed
    pub fn get_access_token(&self) -> Result<String> {
        let stored = match self.cached.lock().ok().and_then(|c| c.clone()) {
            Some(token) => Some(token),
            None => self.load_token().ok(),
        };
        let Some(token) = stored else {
            bail!(
                "No Gmail token found at {}; run with --configure first",
                self.token_path.display()
            );
        };

        if token.is_fresh(chrono::Utc::now().timestamp()) {
            self.remember(&token);
            return Ok(token.access_token);
        }

        let Some(refresh_token) = token.refresh_token else {
            bail!("Gmail token expired and cannot be refreshed; run with --configure");
        };

        debug!("Refreshing Gmail access token");
        let response = self.refresh_access_token(&refresh_token)?;
        let stored = self.save_token_response(&response)?;
        self.remember(&stored);
        Ok(stored.access_token)
    }

    fn remember(&self, token: &StoredToken) {
        if let Ok(mut cached) = self.cached.lock() {
            *cached = Some(token.clone());
        }
    }

    /// Run the interactive authorization code flow and store the tokens.
    ///
    /// Prints instructions to stdout; call before the terminal UI starts.
    pub fn configure(&self) -> Result<()> {
        let (listener, port) = self.start_local_server()?;
        let redirect_uri = format!("http://localhost:{}", port);

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            Self::AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(self.scope.url()),
        );

        println!("Opening browser for Gmail authentication...");
        println!("If the browser doesn't open, visit: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        println!("Waiting for authorization...");
        let code = self.wait_for_callback(listener)?;

        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .context("Failed to exchange authorization code")?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        let stored = self.save_token_response(&token)?;
        self.remember(&stored);
        info!("Stored Gmail token at {}", self.token_path.display());
        println!("Authentication successful.");
        Ok(())
    }

    /// Start a local TCP server on an available port
    fn start_local_server(&self) -> Result<(TcpListener, u16)> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
                return Ok((listener, port));
            }
        }
        bail!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )
    }

    /// Wait for OAuth callback and extract authorization code
    fn wait_for_callback(&self, listener: TcpListener) -> Result<String> {
        let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

        let mut request_line = String::new();
        BufReader::new(&stream)
            .read_line(&mut request_line)
            .context("Failed to read request")?;

        let code = query_param(&request_line, "code");
        let (status, body) = if code.is_some() {
            ("200 OK", "Authentication successful! You can close this window.")
        } else {
            ("400 Bad Request", "Authentication failed. Please try again.")
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
            status, body
        );
        stream.write_all(response.as_bytes()).ok();

        if let Some(err) = query_param(&request_line, "error") {
            bail!("OAuth error: {}", err);
        }
        code.context("No authorization code received")
    }

    /// Refresh an access token using a refresh token
    fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .context("Failed to refresh access token")?;

        let mut token: TokenResponse = response
            .into_body()
            .read_json()
            .context("Failed to parse refresh token response")?;

        // Google omits the refresh token on refresh; keep the old one
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        Ok(token)
    }

    fn load_token(&self) -> Result<StoredToken> {
        let content = fs::read_to_string(&self.token_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_token_response(&self, token: &TokenResponse) -> Result<StoredToken> {
        let stored = StoredToken {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token
                .expires_in
                .map(|d| chrono::Utc::now().timestamp() + d as i64),
        };
        config::save_json_file(&self.token_path, &stored)?;
        Ok(stored)
    }
}

/// Extract a query parameter from an HTTP request line
/// (`GET /?code=abc&scope=... HTTP/1.1`)
fn query_param(request_line: &str, key: &str) -> Option<String> {
    let path = request_line.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;
    query.split('&').find_map(|param| {
        let (name, value) = param.split_once('=')?;
        (name == key).then(|| value.to_string())
    })
}
