//! HTTP endpoints: `/metrics` for Prometheus and `/health` for liveness.

use crate::exporter::Exporter;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::error;

/// Shared application state for the metrics API
#[derive(Clone)]
pub struct MetricsAppState {
    pub exporter: Arc<Exporter>,
}

pub fn create_metrics_router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(MetricsAppState { exporter })
}

/// GET /metrics - run one scrape and render it in the text exposition format.
async fn metrics(State(state): State<MetricsAppState>) -> Result<Response, AppError> {
    let body = state.exporter.render().await.map_err(|e| {
        error!(error = %format!("{:#}", e), "Failed to render metrics");
        AppError::InternalServerError("Failed to render metrics".to_string())
    })?;

    Ok((
        [(header::CONTENT_TYPE, state.exporter.content_type())],
        body,
    )
        .into_response())
}

async fn health() -> &'static str {
    "ok"
}

/// Application error types
enum AppError {
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, message).into_response()
    }
}
