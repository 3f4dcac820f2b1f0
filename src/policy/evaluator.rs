//! Approval decision procedure
//!
//! Evaluation is a pure function of the allow-list, the actor and the
//! injected [`ActorAuthorizer`]. Anything missing or unverified resolves to
//! a rejection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::policy::allow_list::AllowList;

pub const REASON_NO_ALLOW_LIST: &str = "no allow list found";
pub const REASON_NOT_VALIDATED: &str = "request not yet validated";
pub const REASON_UNKNOWN_ACTOR: &str = "requesting actor unknown";

/// Wire values accepted by the pending-deployments review endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionState {
    Approved,
    Rejected,
}

impl fmt::Display for DecisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionState::Approved => write!(f, "approved"),
            DecisionState::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub state: DecisionState,
    pub reason: String,
    pub environment_ids: Vec<u64>,
}

impl ApprovalDecision {
    pub fn approved(reason: impl Into<String>) -> Self {
        Self {
            state: DecisionState::Approved,
            reason: reason.into(),
            environment_ids: Vec::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            state: DecisionState::Rejected,
            reason: reason.into(),
            environment_ids: Vec::new(),
        }
    }

    /// Attach the environments this decision applies to.
    pub fn for_environments(self, environment_ids: Vec<u64>) -> Self {
        Self {
            environment_ids,
            ..self
        }
    }

    pub fn is_approved(&self) -> bool {
        self.state == DecisionState::Approved
    }
}

/// Pluggable actor checks. Implementations must be deterministic.
pub trait ActorAuthorizer: Send + Sync {
    fn is_team_member(&self, team: &str, actor: &str) -> bool;

    /// Secondary check that `actor` really is who the event claims.
    fn validate_identity(&self, actor: &str) -> bool;
}

/// Denies every team membership and identity check.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl ActorAuthorizer for DenyAll {
    fn is_team_member(&self, _team: &str, _actor: &str) -> bool {
        false
    }

    fn validate_identity(&self, _actor: &str) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct PolicyEvaluator {
    authorizer: Arc<dyn ActorAuthorizer>,
}

impl Default for PolicyEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(DenyAll))
    }
}

impl PolicyEvaluator {
    pub fn new(authorizer: Arc<dyn ActorAuthorizer>) -> Self {
        Self { authorizer }
    }

    pub fn evaluate(&self, allow_list: Option<&AllowList>, actor: &str) -> ApprovalDecision {
        let Some(allow_list) = allow_list else {
            info!("Rejecting {}: {}", actor, REASON_NO_ALLOW_LIST);
            return ApprovalDecision::rejected(REASON_NO_ALLOW_LIST);
        };

        if actor.is_empty() {
            return ApprovalDecision::rejected(REASON_UNKNOWN_ACTOR);
        }

        for team in &allow_list.teams {
            if self.authorizer.is_team_member(team, actor) {
                info!("Approving {}: member of team {}", actor, team);
                return ApprovalDecision::approved(format!(
                    "{} is a member of allowed team {}",
                    actor, team
                ));
            }
        }

        for user in &allow_list.users {
            if user != actor {
                continue;
            }
            if self.authorizer.validate_identity(actor) {
                info!("Approving {}: allowed user", actor);
                return ApprovalDecision::approved(format!("{} is an allowed user", actor));
            }
            debug!("{} is listed but identity validation did not pass", actor);
        }

        info!("Rejecting {}: {}", actor, REASON_NOT_VALIDATED);
        ApprovalDecision::rejected(REASON_NOT_VALIDATED)
    }
}
