//! Geopix Storage Library
//!
//! This crate provides the bucket abstraction used by the photo pipeline: the [`Storage`]
//! trait and implementations for S3-compatible object stores and the local filesystem.
//!
//! # Buckets and keys
//!
//! A [`Storage`] value is bound to exactly one bucket; the pipeline holds one per bucket it
//! touches (upload source, final images, thumbnails). Keys are object names inside that bucket.
//! Keys must not be empty, contain `..`, or start with `/`; validation lives in the `keys`
//! module so every backend applies the same rules.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod transfer;

// Re-export commonly used types
pub use factory::create_storage;
pub use geopix_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use transfer::{download_to_file, upload_file};
