//! Deployment review pipeline
//!
//! Request-scoped: resolve the environment id, evaluate the policy, submit
//! the decision. Nothing survives past one event.

use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::GatekeeperError;
use crate::github::credentials::CredentialProvider;
use crate::github::environments::{is_repository_api_url, EnvironmentResolver};
use crate::github::responder::DeploymentResponder;
use crate::policy::allow_list::AllowListFetcher;
use crate::policy::evaluator::{
    ActorAuthorizer, ApprovalDecision, DenyAll, PolicyEvaluator, REASON_UNKNOWN_ACTOR,
};
use crate::webhooks::event::DeploymentReviewEvent;

/// Terminal outcome of one `requested` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Submitted {
        environment_id: u64,
        decision: ApprovalDecision,
    },
    SubmissionFailed {
        environment_id: u64,
        decision: ApprovalDecision,
        error: String,
    },
    EnvironmentNotFound {
        environment: String,
    },
    Failed {
        error: String,
    },
}

pub struct ReviewPipeline {
    resolver: EnvironmentResolver,
    fetcher: AllowListFetcher,
    evaluator: PolicyEvaluator,
    responder: DeploymentResponder,
    github_api_url: String,
    allow_list_url: String,
    approver_token: String,
}

impl ReviewPipeline {
    /// Wire every component from the startup configuration, with the
    /// default deny-all actor checks.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatekeeperError> {
        Self::with_authorizer(config, Arc::new(DenyAll))
    }

    pub fn with_authorizer(
        config: &AppConfig,
        authorizer: Arc<dyn ActorAuthorizer>,
    ) -> Result<Self, GatekeeperError> {
        let credentials = CredentialProvider::new(config)?;
        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatekeeperError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            resolver: EnvironmentResolver::new(http_client.clone(), credentials),
            fetcher: AllowListFetcher::new(http_client.clone()),
            evaluator: PolicyEvaluator::new(authorizer),
            responder: DeploymentResponder::new(http_client),
            github_api_url: config.github_api_url.clone(),
            allow_list_url: config.allow_list_url.clone(),
            approver_token: config.approver_token.clone(),
        })
    }

    pub async fn process(&self, event: &DeploymentReviewEvent) -> ReviewOutcome {
        // Credentials are only ever sent to the configured API host.
        if !is_repository_api_url(&self.github_api_url, &event.repo_api_url) {
            warn!(
                "Refusing repository url {} outside {}",
                event.repo_api_url, self.github_api_url
            );
            return ReviewOutcome::Failed {
                error: format!("repository url {} is not served by {}", event.repo_api_url, self.github_api_url),
            };
        }

        let pending_url = event.pending_deployments_url();

        info!(
            "Requested: environment={} status={:?} html_url={:?} run={} job={:?} repo={}/{}",
            event.environment_name,
            event.status,
            event.html_url,
            event.workflow_run_id,
            event.workflow_job_run_id,
            event.owner,
            event.repo_name
        );

        let pending = match self
            .resolver
            .resolve_environment_id(&pending_url, &event.owner, &event.repo_name, &event.environment_name)
            .await
        {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                warn!(
                    "Environment {} is not pending for run {}; nothing to review",
                    event.environment_name, event.workflow_run_id
                );
                return ReviewOutcome::EnvironmentNotFound {
                    environment: event.environment_name.clone(),
                };
            }
            Err(e) => {
                error!("Could not resolve environment {}: {}", event.environment_name, e);
                return ReviewOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        info!("Environment ID: {}", pending.environment_id);

        let decision = match event.requestor_login.as_deref() {
            Some(actor) => {
                let allow_list = self.fetcher.fetch_allow_list(&self.allow_list_url).await;
                self.evaluator.evaluate(allow_list.as_ref(), actor)
            }
            None => ApprovalDecision::rejected(REASON_UNKNOWN_ACTOR),
        }
        .for_environments(vec![pending.environment_id]);

        match self
            .responder
            .submit_decision(&pending_url, &decision, &self.approver_token)
            .await
        {
            Ok(ack) => {
                info!("Submitted {} ({}) with status {}", decision.state, decision.reason, ack.status);
                ReviewOutcome::Submitted {
                    environment_id: pending.environment_id,
                    decision,
                }
            }
            Err(e) => {
                error!("Submission failed, not retrying: {}", e);
                ReviewOutcome::SubmissionFailed {
                    environment_id: pending.environment_id,
                    decision,
                    error: e.to_string(),
                }
            }
        }
    }
}
