//! Approval policy: the remote allow-list and the decision procedure over it.

pub mod allow_list;
pub mod evaluator;

pub use allow_list::{AllowList, AllowListFetcher};
pub use evaluator::{ActorAuthorizer, ApprovalDecision, DecisionState, DenyAll, PolicyEvaluator};
