//! Route configuration

use crate::handlers::{event::handle_event, health::health_check};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Notifications are small JSON documents
const MAX_NOTIFICATION_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_event))
        .route("/health", get(health_check))
        .layer(RequestBodyLimitLayer::new(MAX_NOTIFICATION_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
