use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::webhooks::deployment_review::ReviewPipeline;
use crate::webhooks::event::{DeploymentReviewEvent, ReviewAction, ReviewNotification};

pub const DELIVERY_HEADER: &str = "x-github-delivery";
pub const EVENT_HEADER: &str = "x-github-event";
const DEPLOYMENT_REVIEW_EVENT: &str = "deployment_review";

/// Dispatch one `deployment_review` delivery.
///
/// Once the payload parses, the answer is always `200 OK`: downstream
/// failures are terminal for the event and must not trigger redelivery.
pub async fn handle_webhook(
    State(pipeline): State<Arc<ReviewPipeline>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let delivery = headers
        .get(DELIVERY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let event_name = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let span = info_span!("deployment_review", delivery = %delivery);
    dispatch(&pipeline, event_name.as_deref(), &payload)
        .instrument(span)
        .await
}

async fn dispatch(
    pipeline: &ReviewPipeline,
    event_name: Option<&str>,
    payload: &Value,
) -> (StatusCode, Json<Value>) {
    info!("Message Received");

    // Deliveries without the event header are treated as deployment reviews.
    if let Some(name) = event_name.filter(|name| *name != DEPLOYMENT_REVIEW_EVENT) {
        info!("Ignoring {} event", name);
        return (
            StatusCode::OK,
            Json(json!({"status": "ignored", "event": name})),
        );
    }

    match ReviewAction::from_payload(payload) {
        ReviewAction::Requested => {
            let event = match DeploymentReviewEvent::from_payload(payload) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Rejecting malformed requested event: {}", e);
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"status": "invalid", "error": e.to_string()})),
                    );
                }
            };

            let outcome = pipeline.process(&event).await;
            let body = serde_json::to_value(&outcome)
                .unwrap_or_else(|_| json!({"status": "failed"}));
            (StatusCode::OK, Json(body))
        }
        action @ (ReviewAction::Approved | ReviewAction::Rejected) => {
            let notification = ReviewNotification::from_payload(payload);
            let label = if action == ReviewAction::Approved {
                "Approved"
            } else {
                "Rejected"
            };
            info!(
                "{}: approver={} comment={}",
                label,
                notification.approver_login.as_deref().unwrap_or("unknown"),
                notification.comment.as_deref().unwrap_or("")
            );
            (
                StatusCode::OK,
                Json(json!({
                    "status": "recorded",
                    "action": label.to_lowercase(),
                    "approver": notification.approver_login,
                })),
            )
        }
        ReviewAction::Other(action) => {
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
            info!("Unknown action {}: {}", action, pretty);
            (
                StatusCode::OK,
                Json(json!({"status": "ignored", "action": action})),
            )
        }
    }
}
