//! Catalog backend selection

use anyhow::{Context, Result};
use geopix_core::{CatalogBackend, Config};
use geopix_db::{InMemoryCatalog, PhotoCatalog, PhotoRepository};
use std::sync::Arc;

/// Build the configured catalog. Postgres connects and migrates before returning.
pub async fn setup_catalog(config: &Config) -> Result<Arc<dyn PhotoCatalog>> {
    match config.catalog_backend() {
        CatalogBackend::Postgres => {
            let url = config
                .database_url()
                .context("DATABASE_URL must be set when using the postgres catalog backend")?;
            let pool = geopix_db::connect(
                url,
                config.db_max_connections(),
                config.db_timeout_seconds(),
            )
            .await?;
            Ok(Arc::new(PhotoRepository::new(pool)))
        }
        CatalogBackend::Memory => {
            tracing::warn!("Using in-memory catalog; records are lost on restart");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
    }
}
