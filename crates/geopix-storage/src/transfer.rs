//! Moving objects between a bucket and the local filesystem.

use crate::traits::{Storage, StorageError, StorageResult};
use futures::StreamExt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stream an object into a local file, returning the number of bytes written.
///
/// The file is flushed and synced before returning, so callers may read it immediately.
pub async fn download_to_file(
    storage: &dyn Storage,
    storage_key: &str,
    destination: &Path,
) -> StorageResult<u64> {
    let mut stream = storage.download_stream(storage_key).await?;

    let mut file = fs::File::create(destination).await.map_err(|e| {
        StorageError::DownloadFailed(format!(
            "Failed to create {}: {}",
            destination.display(),
            e
        ))
    })?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;

    tracing::debug!(
        bucket = %storage.bucket(),
        key = %storage_key,
        path = %destination.display(),
        size_bytes = written,
        "Object downloaded to local file"
    );

    Ok(written)
}

/// Upload a local file under `storage_key`. Returns the backend URL of the stored object.
pub async fn upload_file(
    storage: &dyn Storage,
    source: &Path,
    storage_key: &str,
    content_type: &str,
) -> StorageResult<String> {
    let file = fs::File::open(source).await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
    })?;
    let content_length = file.metadata().await.ok().map(|m| m.len());

    storage
        .upload_stream(storage_key, content_type, content_length, Box::pin(file))
        .await
}
