//! Deployment review events
//!
//! Flattens the nested `deployment_review` webhook payload into the handful
//! of identifiers the pipeline needs.

use serde_json::Value;

use crate::error::GatekeeperError;
use crate::github::environments::pending_deployments_url;
use crate::github::types::DeploymentReviewPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Requested,
    Approved,
    Rejected,
    Other(String),
}

impl ReviewAction {
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("action").and_then(|v| v.as_str()) {
            Some("requested") => ReviewAction::Requested,
            Some("approved") => ReviewAction::Approved,
            Some("rejected") => ReviewAction::Rejected,
            Some(other) => ReviewAction::Other(other.to_string()),
            None => ReviewAction::Other("unknown".to_string()),
        }
    }
}

/// A `requested` deployment review: everything needed to resolve, evaluate
/// and answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReviewEvent {
    pub owner: String,
    pub repo_name: String,
    pub repo_api_url: String,
    pub workflow_run_id: u64,
    pub workflow_job_run_id: Option<u64>,
    pub environment_name: String,
    pub status: Option<String>,
    pub html_url: Option<String>,
    /// Who triggered the run waiting for approval, never the reviewer.
    pub requestor_login: Option<String>,
}

/// Terminal `approved`/`rejected` notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewNotification {
    pub approver_login: Option<String>,
    pub comment: Option<String>,
}

impl DeploymentReviewEvent {
    pub fn from_payload(payload: &Value) -> Result<Self, GatekeeperError> {
        let parsed: DeploymentReviewPayload = serde_json::from_value(payload.clone())?;

        let environment_name = parsed
            .environment
            .filter(|name| !name.is_empty())
            .ok_or_else(|| missing("environment"))?;
        let repository = parsed.repository.ok_or_else(|| missing("repository"))?;
        let workflow_run = parsed.workflow_run.ok_or_else(|| missing("workflow_run"))?;

        if repository.owner.login.is_empty() || repository.name.is_empty() {
            return Err(missing("repository.owner.login/repository.name"));
        }

        let requestor_login = [parsed.requestor, workflow_run.triggering_actor, workflow_run.actor]
            .into_iter()
            .flatten()
            .map(|user| user.login)
            .find(|login| !login.is_empty());

        let job = parsed.workflow_job_run;

        Ok(Self {
            owner: repository.owner.login,
            repo_name: repository.name,
            repo_api_url: repository.url,
            workflow_run_id: workflow_run.id,
            workflow_job_run_id: job.as_ref().map(|j| j.id),
            environment_name,
            status: job.as_ref().and_then(|j| j.status.clone()),
            html_url: job.and_then(|j| j.html_url),
            requestor_login,
        })
    }

    pub fn pending_deployments_url(&self) -> String {
        pending_deployments_url(&self.repo_api_url, self.workflow_run_id)
    }
}

impl ReviewNotification {
    pub fn from_payload(payload: &Value) -> Self {
        let approver_login = payload
            .get("approver")
            .and_then(|a| a.get("login"))
            .and_then(|l| l.as_str())
            .map(str::to_string);
        let comment = payload
            .get("comment")
            .and_then(|c| c.as_str())
            .map(str::to_string);

        Self {
            approver_login,
            comment,
        }
    }
}

fn missing(field: &str) -> GatekeeperError {
    GatekeeperError::InvalidPayload(format!("missing {}", field))
}
