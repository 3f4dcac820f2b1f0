use serde::{Deserialize, Serialize};

use crate::policy::evaluator::DecisionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    /// REST API url of the repository, e.g. `https://api.github.com/repos/acme/widgets`.
    pub url: String,
    pub owner: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub actor: Option<User>,
    #[serde(default)]
    pub triggering_actor: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowJobRun {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// `deployment_review` webhook payload as sent for the `requested` action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReviewPayload {
    pub action: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub repository: Option<Repository>,
    #[serde(default)]
    pub workflow_run: Option<WorkflowRun>,
    #[serde(default)]
    pub workflow_job_run: Option<WorkflowJobRun>,
    #[serde(default)]
    pub requestor: Option<User>,
}

/// Environment reference nested inside a pending deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentRef {
    pub id: u64,
    pub name: String,
}

/// One entry of `GET .../actions/runs/{run_id}/pending_deployments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDeploymentEntry {
    pub environment: EnvironmentRef,
}

/// Body of `POST .../actions/runs/{run_id}/pending_deployments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPendingDeployments {
    pub environment_ids: Vec<u64>,
    pub state: DecisionState,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRef {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}
