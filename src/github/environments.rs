//! Environment resolution
//!
//! Maps a human-readable environment name to the numeric environment id
//! GitHub requires when reviewing a pending deployment.

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::GatekeeperError;
use crate::github::credentials::CredentialProvider;
use crate::github::types::PendingDeploymentEntry;

/// A pending deployment whose environment id has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    pub environment_name: String,
    pub environment_id: u64,
}

/// `{repo_api_url}/actions/runs/{run_id}/pending_deployments`
pub fn pending_deployments_url(repo_api_url: &str, workflow_run_id: u64) -> String {
    format!(
        "{}/actions/runs/{}/pending_deployments",
        repo_api_url.trim_end_matches('/'),
        workflow_run_id
    )
}

/// Whether `repo_api_url` is a repository resource of the configured API.
pub fn is_repository_api_url(github_api_url: &str, repo_api_url: &str) -> bool {
    let prefix = format!("{}/repos/", github_api_url.trim_end_matches('/'));
    repo_api_url
        .strip_prefix(&prefix)
        .map(|rest| !rest.is_empty())
        .unwrap_or(false)
}

/// First entry whose environment name matches exactly (case-sensitive).
pub fn find_environment_id(entries: &[PendingDeploymentEntry], environment_name: &str) -> Option<u64> {
    entries
        .iter()
        .find(|entry| entry.environment.name == environment_name)
        .map(|entry| entry.environment.id)
}

pub struct EnvironmentResolver {
    http_client: Client,
    credentials: CredentialProvider,
}

impl EnvironmentResolver {
    pub fn new(http_client: Client, credentials: CredentialProvider) -> Self {
        Self {
            http_client,
            credentials,
        }
    }

    /// Returns `Ok(None)` when the environment is not (yet) listed as pending.
    /// That is an expected race with webhook delivery, not a failure.
    pub async fn resolve_environment_id(
        &self,
        pending_url: &str,
        owner: &str,
        repo: &str,
        environment_name: &str,
    ) -> Result<Option<PendingDeployment>, GatekeeperError> {
        let credential = self.credentials.installation_token(owner, repo).await?;

        info!("Getting environment details for {} from {}", environment_name, pending_url);
        let response = self
            .http_client
            .get(pending_url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", credential.token))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatekeeperError::from(e)
                } else {
                    GatekeeperError::UpstreamUnavailable(format!("pending deployments request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Pending deployments request returned {}", status);
            return Err(GatekeeperError::UpstreamUnavailable(format!(
                "pending deployments returned {}",
                status
            )));
        }

        let entries: Vec<PendingDeploymentEntry> = response.json().await.map_err(|e| {
            GatekeeperError::UpstreamUnavailable(format!("invalid pending deployments body: {}", e))
        })?;
        debug!("{} pending deployment(s) listed", entries.len());

        Ok(find_environment_id(&entries, environment_name).map(|environment_id| PendingDeployment {
            environment_name: environment_name.to_string(),
            environment_id,
        }))
    }
}
