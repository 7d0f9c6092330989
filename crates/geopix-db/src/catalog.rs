//! Catalog trait abstraction
//!
//! The pipeline only ever inserts records, so the seam is a single operation. This allows
//! the pipeline to be tested without a database.

use async_trait::async_trait;
use chrono::Utc;
use geopix_core::{AppError, NewPhotoRecord, PhotoRecord};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::db::PhotoRepository;

/// Write side of the photo catalog
#[async_trait]
pub trait PhotoCatalog: Send + Sync {
    /// Persist one record and return it with its store-assigned identity.
    async fn insert(&self, record: NewPhotoRecord) -> Result<PhotoRecord, AppError>;
}

#[async_trait]
impl PhotoCatalog for PhotoRepository {
    async fn insert(&self, record: NewPhotoRecord) -> Result<PhotoRecord, AppError> {
        self.create(record).await
    }
}

/// Catalog kept in process memory.
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    records: Arc<Mutex<Vec<PhotoRecord>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PhotoRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All records in insertion order
    pub fn records(&self) -> Vec<PhotoRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl PhotoCatalog for InMemoryCatalog {
    async fn insert(&self, record: NewPhotoRecord) -> Result<PhotoRecord, AppError> {
        let stored = PhotoRecord {
            id: Uuid::new_v4(),
            image_name: record.image_name,
            image_url: record.image_url,
            thumb_url: record.thumb_url,
            latitude: record.latitude,
            longitude: record.longitude,
            created_at: Utc::now(),
        };
        self.lock().push(stored.clone());
        Ok(stored)
    }
}
