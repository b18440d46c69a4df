//! Health check handlers and response types.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: &'static str,
    /// Whether `REMOVE_BG_API_KEY` is set
    pub removal_configured: bool,
    pub version: &'static str,
}

/// Liveness probe - process is running.
pub(super) async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Health check. Reports configuration only; upstreams are not probed.
pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let removal_configured = state.removal_configured();
    let status = if removal_configured {
        "healthy"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        Json(HealthCheckResponse {
            status,
            removal_configured,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
