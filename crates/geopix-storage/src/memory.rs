//! In-process storage for tests.

use crate::keys::validate_key;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Storage implementation that keeps objects in memory.
///
/// Clones share the same objects, so a test can keep a handle for assertions while the
/// pipeline owns another. Uploads and deletes can be made to fail, and downloads are counted.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_uploads: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    downloads: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed an object
    pub fn put_object(&self, key: &str, data: Vec<u8>) {
        self.objects().insert(key.to_string(), data);
    }

    /// Object contents, for assertions
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    /// Sorted object keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of download calls served so far
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn generate_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    fn store(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<String> {
        validate_key(storage_key)?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!(
                "upload to {}/{} rejected",
                self.bucket, storage_key
            )));
        }
        self.objects().insert(storage_key.to_string(), data);
        Ok(self.generate_url(storage_key))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        validate_key(storage_key)?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let data = self
            .object(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))?;
        Ok(Box::pin(stream::once(async move { Ok(Bytes::from(data)) })))
    }

    async fn upload_stream(
        &self,
        storage_key: &str,
        _content_type: &str,
        _content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        self.store(storage_key, data)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(format!(
                "delete of {}/{} rejected",
                self.bucket, storage_key
            )));
        }
        self.objects().remove(storage_key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
