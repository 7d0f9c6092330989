//! Geopix Core Library
//!
//! This crate provides the domain models, error types, configuration, and URL helpers
//! shared by the storage, catalog, processing, and function crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod public_url;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, CatalogBackend, Config, PhotoFunctionConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{GpsFix, NewPhotoRecord, PhotoRecord, StorageObject};
pub use public_url::public_object_url;
pub use storage_types::StorageBackend;
