use crate::keys::validate_key;
use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

/// S3 storage implementation
///
/// Works against AWS S3 and S3-compatible endpoints (MinIO, GCS interoperability, ...).
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO, "https://storage.googleapis.com" for GCS)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Generate the backend URL for an object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style `{endpoint}/{bucket}/{key}`
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    async fn put(
        &self,
        storage_key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let size = bytes.len() as u64;
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let opts = PutOptions {
            attributes: Attributes::from_iter([(Attribute::ContentType, content_type.to_string())]),
            ..Default::default()
        };
        let result: ObjectResult<_> =
            object_store::ObjectStore::put_opts(&self.store, &location, PutPayload::from(bytes), opts)
                .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                content_type,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            content_type,
            "S3 upload successful"
        );

        Ok(self.generate_url(storage_key))
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        validate_key(storage_key)?;
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bucket = self.bucket.clone();
        let key = storage_key.to_string();

        let stream = result.into_stream().map(move |res| match res {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
                Err(StorageError::DownloadFailed(e.to_string()))
            }
        });

        Ok(Box::pin(stream))
    }

    async fn upload_stream(
        &self,
        storage_key: &str,
        content_type: &str,
        content_length: Option<u64>,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        // Photos are small enough to buffer; a single put keeps the upload atomic.
        let mut buffer = Vec::with_capacity(content_length.unwrap_or(0) as usize);
        reader
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Failed to read from stream: {}", e)))?;

        self.put(storage_key, Bytes::from(buffer), content_type).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
