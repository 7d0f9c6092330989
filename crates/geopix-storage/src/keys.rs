//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that are empty, absolute, or could escape the bucket.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid path segments: {}",
            key
        )));
    }
    Ok(())
}
