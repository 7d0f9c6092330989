//! Health check handler.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub environment: String,
}

/// Liveness check reporting the deployed revision.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = &state.config;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            service: config.service_name().to_string(),
            version: config.service_version().to_string(),
            revision: config.revision().map(String::from),
            environment: config.environment().to_string(),
        }),
    )
}
