//! Configuration module
//!
//! Deployment-time settings: destination buckets, the public URL host, storage and catalog
//! backends, and logging. Values come from the process environment (with `.env` support).

use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_PUBLIC_URL_HOST, DEFAULT_THUMBNAIL_WIDTH};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Catalog backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    Postgres,
    /// Process-local catalog; records are lost on restart. Useful for local runs.
    Memory,
}

impl FromStr for CatalogBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(CatalogBackend::Postgres),
            "memory" => Ok(CatalogBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid catalog backend: {}", s)),
        }
    }
}

/// Process-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    /// Revision of the deployed function (`K_REVISION`), logged on every invocation.
    pub revision: Option<String>,
    pub log_json: bool,
    pub service_name: String,
    pub service_version: String,
}

/// Photo function configuration
#[derive(Clone, Debug)]
pub struct PhotoFunctionConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, GCS interop, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Destinations
    pub final_bucket: String,
    pub thumbnail_bucket: String,
    pub public_url_host: String,
    pub thumbnail_width: u32,
    // Catalog configuration
    pub catalog_backend: CatalogBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PhotoFunctionConfig>);

impl Config {
    fn as_function(&self) -> &PhotoFunctionConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_function().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = PhotoFunctionConfig::from_lookup(lookup)?;
        config.validate()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_function().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_function().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_function().base.environment
    }

    pub fn revision(&self) -> Option<&str> {
        self.as_function().base.revision.as_deref()
    }

    pub fn log_json(&self) -> bool {
        self.as_function().base.log_json
    }

    pub fn service_name(&self) -> &str {
        &self.as_function().base.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.as_function().base.service_version
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_function().storage_backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_function().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_function().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_function().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_function().local_storage_base_url.as_deref()
    }

    pub fn final_bucket(&self) -> &str {
        &self.as_function().final_bucket
    }

    pub fn thumbnail_bucket(&self) -> &str {
        &self.as_function().thumbnail_bucket
    }

    pub fn public_url_host(&self) -> &str {
        &self.as_function().public_url_host
    }

    pub fn thumbnail_width(&self) -> u32 {
        self.as_function().thumbnail_width
    }

    pub fn catalog_backend(&self) -> CatalogBackend {
        self.as_function().catalog_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_function().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_function().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_function().db_timeout_seconds
    }
}

impl PhotoFunctionConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let base = BaseConfig {
            server_port: non_empty("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            revision: non_empty("K_REVISION"),
            log_json: non_empty("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            service_name: non_empty("K_SERVICE").unwrap_or_else(|| "geopix-function".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let catalog_backend = match non_empty("CATALOG_BACKEND") {
            Some(value) => value.parse()?,
            None => CatalogBackend::Postgres,
        };

        Ok(PhotoFunctionConfig {
            base,
            storage_backend,
            s3_region: non_empty("S3_REGION").or_else(|| non_empty("AWS_REGION")),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            final_bucket: non_empty("FINAL_BUCKET")
                .ok_or_else(|| anyhow::anyhow!("FINAL_BUCKET must be set"))?,
            thumbnail_bucket: non_empty("THUMBNAIL_BUCKET")
                .ok_or_else(|| anyhow::anyhow!("THUMBNAIL_BUCKET must be set"))?,
            public_url_host: non_empty("PUBLIC_URL_HOST")
                .unwrap_or_else(|| DEFAULT_PUBLIC_URL_HOST.to_string()),
            thumbnail_width: non_empty("THUMBNAIL_WIDTH")
                .map(|v| {
                    v.parse()
                        .map_err(|_| anyhow::anyhow!("THUMBNAIL_WIDTH must be a valid number"))
                })
                .transpose()?
                .unwrap_or(DEFAULT_THUMBNAIL_WIDTH),
            catalog_backend,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: non_empty("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.final_bucket == self.thumbnail_bucket {
            return Err(anyhow::anyhow!(
                "FINAL_BUCKET and THUMBNAIL_BUCKET must name different buckets"
            ));
        }

        if self.thumbnail_width == 0 {
            return Err(anyhow::anyhow!("THUMBNAIL_WIDTH must be greater than zero"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.catalog_backend == CatalogBackend::Postgres {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                }
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when using the postgres catalog backend"
                    ))
                }
            }
        }

        Ok(())
    }
}
