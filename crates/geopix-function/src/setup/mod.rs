//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use geopix_core::Config;
use std::sync::Arc;

/// Initialize the application: validate config, connect the catalog, build routes
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    config.validate()?;

    tracing::info!(
        service = config.service_name(),
        version = config.service_version(),
        revision = config.revision().unwrap_or("unknown"),
        environment = config.environment(),
        storage_backend = %config.storage_backend(),
        final_bucket = config.final_bucket(),
        thumbnail_bucket = config.thumbnail_bucket(),
        "Starting geopix function"
    );

    let catalog = database::setup_catalog(&config).await?;
    let state = Arc::new(AppState::new(config, catalog));
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
