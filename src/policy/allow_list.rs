//! Allow-list fetching
//!
//! The policy document lives behind a contents-API style endpoint that wraps
//! the file in a JSON envelope with a base64 `content` field. The decoded
//! document carries two optional sequences:
//!
//! ```yaml
//! allow_teams:
//!   - acme/release-managers
//! allow_users:
//!   - alice
//! ```
//!
//! A missing or unreadable document is a valid state ("no policy found"),
//! reported as `None` so the evaluator can reject.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GatekeeperError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    #[serde(default, rename = "allow_teams")]
    pub teams: Vec<String>,
    #[serde(default, rename = "allow_users")]
    pub users: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContentEnvelope {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl AllowList {
    /// Decode the base64 `content` of a contents envelope into an allow-list.
    pub fn from_encoded(content: &str) -> Result<Self, GatekeeperError> {
        // The contents API wraps base64 at 60 columns.
        let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD.decode(compact).map_err(|e| {
            GatekeeperError::UpstreamUnavailable(format!("allow list is not valid base64: {}", e))
        })?;
        let document = String::from_utf8(bytes).map_err(|e| {
            GatekeeperError::UpstreamUnavailable(format!("allow list is not valid UTF-8: {}", e))
        })?;
        Self::from_document(&document)
    }

    /// Parse a plain YAML (or JSON) allow-list document.
    pub fn from_document(document: &str) -> Result<Self, GatekeeperError> {
        if document.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(document).map_err(|e| {
            GatekeeperError::UpstreamUnavailable(format!("allow list document is malformed: {}", e))
        })
    }
}

pub struct AllowListFetcher {
    http_client: Client,
}

impl AllowListFetcher {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Fetch the current allow-list. Every failure maps to `None`.
    pub async fn fetch_allow_list(&self, url: &str) -> Option<AllowList> {
        match self.try_fetch(url).await {
            Ok(allow_list) => {
                info!(
                    "Loaded allow list: {} team(s), {} user(s)",
                    allow_list.teams.len(),
                    allow_list.users.len()
                );
                Some(allow_list)
            }
            Err(e) => {
                warn!("No usable allow list at {}: {}", url, e);
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<AllowList, GatekeeperError> {
        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| GatekeeperError::UpstreamUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatekeeperError::UpstreamUnavailable(format!(
                "allow list request returned {}",
                status
            )));
        }

        let envelope: ContentEnvelope = response.json().await.map_err(|e| {
            GatekeeperError::UpstreamUnavailable(format!("invalid content envelope: {}", e))
        })?;

        if let Some(encoding) = envelope.encoding.as_deref() {
            if encoding != "base64" {
                return Err(GatekeeperError::UpstreamUnavailable(format!(
                    "unsupported content encoding: {}",
                    encoding
                )));
            }
        }
        debug!("Decoding {} bytes of allow list content", envelope.content.len());

        AllowList::from_encoded(&envelope.content)
    }
}
