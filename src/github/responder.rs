//! Deployment review submission
//!
//! Posts the final approve/reject decision for a workflow run's pending
//! deployments. One attempt per event; failures are reported, never retried.

use reqwest::Client;
use tracing::{error, info};

use crate::error::GatekeeperError;
use crate::github::types::ReviewPendingDeployments;
use crate::policy::evaluator::ApprovalDecision;

/// Acknowledgment returned by GitHub for an accepted review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAck {
    pub status: u16,
}

pub struct DeploymentResponder {
    http_client: Client,
}

impl DeploymentResponder {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Submit `decision` for the pending deployments at `pending_url`,
    /// authenticated with `token`.
    pub async fn submit_decision(
        &self,
        pending_url: &str,
        decision: &ApprovalDecision,
        token: &str,
    ) -> Result<SubmissionAck, GatekeeperError> {
        let body = ReviewPendingDeployments {
            environment_ids: decision.environment_ids.clone(),
            state: decision.state,
            comment: decision.reason.clone(),
        };

        info!(
            "Submitting {} for environment(s) {:?} to {}",
            decision.state, body.environment_ids, pending_url
        );

        let response = self
            .http_client
            .post(pending_url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("token {}", token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Deployment review rejected by GitHub: {} {}", status, message);
            return Err(GatekeeperError::TransportError(format!(
                "review submission returned {}",
                status
            )));
        }

        info!("Deployment review accepted ({})", status);
        Ok(SubmissionAck {
            status: status.as_u16(),
        })
    }
}
