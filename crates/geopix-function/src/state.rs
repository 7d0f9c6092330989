//! Application state shared by handlers.

use geopix_core::Config;
use geopix_db::PhotoCatalog;
use std::sync::Arc;

/// Long-lived handles. Storage handles are not kept here; they are built per notification.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn PhotoCatalog>,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<dyn PhotoCatalog>) -> Self {
        Self { config, catalog }
    }
}
