//! Installation credentials
//!
//! Exchanges the app identity (app id + RSA private key) for a short-lived
//! installation access token scoped to one repository. Tokens are minted
//! per unit of work and never cached.

use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use octocrab::models::AppId;
use octocrab::Octocrab;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::GatekeeperError;
use crate::github::types::{AccessTokenResponse, InstallationRef};

/// A short-lived installation access token.
#[derive(Clone)]
pub struct InstallationCredential {
    pub installation_id: u64,
    pub token: String,
    /// `None` when GitHub did not report (or we could not parse) an expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for InstallationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationCredential")
            .field("installation_id", &self.installation_id)
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mints installation tokens on behalf of the app.
#[derive(Clone)]
pub struct CredentialProvider {
    app: Octocrab,
    timeout: Duration,
}

impl CredentialProvider {
    /// Build the app-authenticated client. A malformed private key is an
    /// [`GatekeeperError::AuthenticationError`] and must abort startup.
    pub fn new(config: &AppConfig) -> Result<Self, GatekeeperError> {
        let key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes()).map_err(|e| {
            GatekeeperError::AuthenticationError(format!("Invalid RSA private key: {}", e))
        })?;

        let app = Octocrab::builder()
            .base_uri(config.github_api_url.as_str())
            .map_err(|e| {
                GatekeeperError::ConfigError(format!(
                    "Invalid GitHub API url {}: {}",
                    config.github_api_url, e
                ))
            })?
            .app(AppId(config.app_id), key)
            .build()
            .map_err(|e| {
                GatekeeperError::AuthenticationError(format!("Failed to create GitHub client: {}", e))
            })?;

        info!("GitHub App client created for app {}", config.app_id);

        Ok(Self {
            app,
            timeout: config.http_timeout,
        })
    }

    /// Resolve the installation for `owner/repo` and mint a token for it.
    pub async fn installation_token(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<InstallationCredential, GatekeeperError> {
        let installation_id = self.installation_id(owner, repo).await?;
        debug!("Resolved installation {} for {}/{}", installation_id, owner, repo);

        let route = format!("/app/installations/{}/access_tokens", installation_id);
        let response: AccessTokenResponse = self
            .bounded(self.app.post(route, None::<&()>))
            .await?
            .map_err(|e| {
                GatekeeperError::AuthenticationError(format!(
                    "Failed to mint installation token: {}",
                    e
                ))
            })?;

        let expires_at = response.expires_at.as_deref().and_then(parse_expiry);
        info!(
            "Minted installation token for {}/{} (installation {}, expires {:?})",
            owner, repo, installation_id, expires_at
        );

        Ok(InstallationCredential {
            installation_id,
            token: response.token,
            expires_at,
        })
    }

    async fn installation_id(&self, owner: &str, repo: &str) -> Result<u64, GatekeeperError> {
        let route = format!("/repos/{}/{}/installation", owner, repo);
        let result: Result<InstallationRef, octocrab::Error> =
            self.bounded(self.app.get(route, None::<&()>)).await?;

        match result {
            Ok(installation) => Ok(installation.id),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                warn!("No installation found for {}/{}", owner, repo);
                Err(GatekeeperError::installation_not_found(owner, repo))
            }
            Err(e) => Err(GatekeeperError::AuthenticationError(format!(
                "Failed to look up installation for {}/{}: {}",
                owner, repo, e
            ))),
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = T>) -> Result<T, GatekeeperError> {
        tokio::time::timeout(self.timeout, call).await.map_err(|_| {
            GatekeeperError::TransportError(format!(
                "GitHub credential exchange timed out after {:?}",
                self.timeout
            ))
        })
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .ok()
}
