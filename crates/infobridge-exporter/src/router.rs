//! HTTP routes.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Run one scrape, Prometheus exposition |
//! | GET | `/health` | Heartbeat |

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use crate::collector::Collector;
use crate::exposition::{encode_text, TEXT_CONTENT_TYPE};

/// Build the exporter router around a shared collector.
pub fn build_router<C>(collector: Arc<C>) -> Router
where
    C: Collector + 'static,
{
    Router::new()
        .route("/metrics", get(metrics::<C>))
        .route("/health", get(health))
        .with_state(collector)
}

/// GET /metrics
async fn metrics<C>(State(collector): State<Arc<C>>) -> Response
where
    C: Collector + 'static,
{
    let mut samples = Vec::new();
    if let Err(e) = collector.collect(&mut samples).await {
        error!(error = %e, "collect aborted");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    match encode_text(&samples) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
