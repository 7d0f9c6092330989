//! Fixed values shared across crates.

/// Width in pixels of generated thumbnails unless overridden by `THUMBNAIL_WIDTH`.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 64;

/// Host used when building catalog URLs unless overridden by `PUBLIC_URL_HOST`.
pub const DEFAULT_PUBLIC_URL_HOST: &str = "storage.cloud.google.com";

/// Query string appended to every catalog URL.
pub const PUBLIC_URL_QUERY: &str = "authuser=1";

/// Name of the catalog table / collection.
pub const PHOTOS_COLLECTION: &str = "photos";

/// Prefix of per-invocation working directories.
pub const WORKING_DIR_PREFIX: &str = "geopix";
