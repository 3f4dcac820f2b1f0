pub mod deployment_review;
pub mod event;
pub mod github;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::webhooks::deployment_review::ReviewPipeline;

/// Routes: `POST /` and `POST /webhooks/github` for deliveries, `GET /health`.
pub fn router(pipeline: Arc<ReviewPipeline>) -> Router {
    Router::new()
        .route("/", post(github::handle_webhook))
        .route("/webhooks/github", post(github::handle_webhook))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(pipeline)
}

async fn health_check() -> axum::response::Json<serde_json::Value> {
    axum::response::Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": chrono::Utc::now()
    }))
}
