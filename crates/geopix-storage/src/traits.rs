//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream returned by [`Storage::download_stream`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Storage abstraction trait
///
/// Every implementation is bound to a single bucket. Keys are object names inside it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Name of the bucket this handle reads and writes.
    fn bucket(&self) -> &str;

    /// Download an object as a stream of chunks
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Upload from a reader until EOF, replacing any existing object. Returns the backend URL of the stored object.
    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
