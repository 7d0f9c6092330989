//! Photo upload pipeline: validate → extract GPS → thumbnail → publish → delete source.
//!
//! [`process_upload`] is the only entry point. It runs the publishing steps and then deletes
//! the source object whatever they returned, so a skipped or failed upload never lingers in
//! the upload bucket.

use std::path::PathBuf;
use std::sync::Arc;

use geopix_core::constants::{DEFAULT_PUBLIC_URL_HOST, DEFAULT_THUMBNAIL_WIDTH, WORKING_DIR_PREFIX};
use geopix_core::{public_object_url, AppError, Config, GpsFix, NewPhotoRecord, PhotoRecord, StorageObject};
use geopix_db::PhotoCatalog;
use geopix_storage::{create_storage, download_to_file, upload_file, Storage, StorageError, StorageResult};
use serde::Serialize;

use crate::dms::{parse_dms, DmsError};
use crate::metadata::read_gps_tags;
use crate::thumbnail::{generate_thumbnail, thumbnail_name, ThumbnailError};
use crate::validator::PhotoFormat;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to create working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("failed to download {bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to upload {bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to delete {bucket}/{key}: {source}")]
    Delete {
        bucket: String,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("invalid GPS coordinates: {0}")]
    Coordinates(#[from] DmsError),

    #[error("thumbnail generation failed: {0}")]
    Thumbnail(#[from] ThumbnailError),

    #[error("failed to write catalog record: {0}")]
    Catalog(#[source] AppError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Catalog(inner) => inner,
            PipelineError::Download { .. }
            | PipelineError::Upload { .. }
            | PipelineError::Delete { .. } => AppError::Storage(err.to_string()),
            PipelineError::Coordinates(_) => AppError::InvalidMetadata(err.to_string()),
            PipelineError::Thumbnail(_) => AppError::ImageProcessing(err.to_string()),
            PipelineError::WorkingDirectory(_) | PipelineError::Task(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

/// Service handles used by one invocation.
#[derive(Clone)]
pub struct PhotoServices {
    /// Bucket the triggering object lives in
    pub source: Arc<dyn Storage>,
    pub finals: Arc<dyn Storage>,
    pub thumbnails: Arc<dyn Storage>,
    pub catalog: Arc<dyn PhotoCatalog>,
}

impl PhotoServices {
    pub fn new(
        source: Arc<dyn Storage>,
        finals: Arc<dyn Storage>,
        thumbnails: Arc<dyn Storage>,
        catalog: Arc<dyn PhotoCatalog>,
    ) -> Self {
        Self {
            source,
            finals,
            thumbnails,
            catalog,
        }
    }

    /// Build storage handles for the event's source bucket and the configured destinations.
    pub async fn for_event(
        config: &Config,
        object: &StorageObject,
        catalog: Arc<dyn PhotoCatalog>,
    ) -> StorageResult<Self> {
        let source = create_storage(config, &object.bucket).await?;
        tracing::debug!(
            backend = %source.backend_type(),
            source_bucket = %object.bucket,
            final_bucket = config.final_bucket(),
            thumbnail_bucket = config.thumbnail_bucket(),
            "Storage handles ready"
        );

        Ok(Self {
            source,
            finals: create_storage(config, config.final_bucket()).await?,
            thumbnails: create_storage(config, config.thumbnail_bucket()).await?,
            catalog,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub public_url_host: String,
    pub thumbnail_width: u32,
    /// Deployed revision, logged with every invocation
    pub revision: Option<String>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_url_host: config.public_url_host().to_string(),
            thumbnail_width: config.thumbnail_width(),
            revision: config.revision().map(String::from),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            public_url_host: DEFAULT_PUBLIC_URL_HOST.to_string(),
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            revision: None,
        }
    }
}

/// What an invocation did with the triggering object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Published {
        record: PhotoRecord,
        #[serde(rename = "thumbnailName")]
        thumbnail_name: String,
    },
    Skipped {
        #[serde(rename = "contentType")]
        content_type: Option<String>,
    },
}

/// Process one uploaded object and delete it from the source bucket.
///
/// When publishing fails the deletion is still attempted and the publishing error is returned.
/// When publishing succeeds a deletion failure is returned instead.
#[tracing::instrument(
    skip(services, settings, object),
    fields(
        bucket = %object.bucket,
        name = %object.name,
        generation = object.generation,
    )
)]
pub async fn process_upload(
    services: &PhotoServices,
    settings: &PipelineSettings,
    object: &StorageObject,
) -> Result<ProcessOutcome, PipelineError> {
    tracing::info!(
        revision = settings.revision.as_deref().unwrap_or("unknown"),
        content_type = object.content_type().unwrap_or("none"),
        metageneration = ?object.metageneration,
        size = ?object.size,
        "Processing uploaded object"
    );

    let published = publish(services, settings, object).await;

    let deleted = services
        .source
        .delete(&object.name)
        .await
        .map_err(|source| PipelineError::Delete {
            bucket: services.source.bucket().to_string(),
            key: object.name.clone(),
            source,
        });

    match (published, deleted) {
        (Ok(outcome), Ok(())) => {
            tracing::info!(deleted = %object.name, "Source object deleted");
            Ok(outcome)
        }
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => {
            tracing::info!(deleted = %object.name, "Source object deleted after failure");
            Err(e)
        }
        (Err(e), Err(delete_err)) => {
            tracing::error!(error = %delete_err, "Failed to delete source object");
            Err(e)
        }
    }
}

async fn publish(
    services: &PhotoServices,
    settings: &PipelineSettings,
    object: &StorageObject,
) -> Result<ProcessOutcome, PipelineError> {
    let Some(format) = PhotoFormat::from_content_type(object.content_type()) else {
        tracing::info!(
            content_type = object.content_type().unwrap_or("none"),
            "Not a JPEG or PNG photo, skipping"
        );
        return Ok(ProcessOutcome::Skipped {
            content_type: object.content_type.clone(),
        });
    };

    let workdir = tempfile::Builder::new()
        .prefix(&format!("{}-{}-", WORKING_DIR_PREFIX, object.generation))
        .tempdir()
        .map_err(PipelineError::WorkingDirectory)?;

    let image_name = format.object_name(object.generation);
    let thumb_name = thumbnail_name(settings.thumbnail_width, object.generation, format);
    let original_path = workdir.path().join(&image_name);
    let thumbnail_path = workdir.path().join(&thumb_name);

    download_to_file(services.source.as_ref(), &object.name, &original_path)
        .await
        .map_err(|source| PipelineError::Download {
            bucket: services.source.bucket().to_string(),
            key: object.name.clone(),
            source,
        })?;

    let gps = extract_gps(original_path.clone()).await?;

    let info = {
        let source = original_path.clone();
        let dest = thumbnail_path.clone();
        let width = settings.thumbnail_width;
        tokio::task::spawn_blocking(move || generate_thumbnail(&source, &dest, format, width))
            .await??
    };
    tracing::debug!(width = info.width, height = info.height, "Thumbnail ready");

    publish_file(services.finals.as_ref(), &original_path, &image_name, format).await?;
    publish_file(services.thumbnails.as_ref(), &thumbnail_path, &thumb_name, format).await?;

    let record = NewPhotoRecord::new(
        image_name.clone(),
        public_object_url(&settings.public_url_host, services.finals.bucket(), &image_name),
        public_object_url(&settings.public_url_host, services.thumbnails.bucket(), &thumb_name),
        gps,
    );
    let record = services
        .catalog
        .insert(record)
        .await
        .map_err(PipelineError::Catalog)?;
    tracing::info!(record_id = %record.id, image_name = %record.image_name, "Catalog record created");

    if let Err(e) = workdir.close() {
        tracing::warn!(error = %e, "Failed to remove working directory");
    }

    Ok(ProcessOutcome::Published {
        record,
        thumbnail_name: thumb_name,
    })
}

async fn extract_gps(path: PathBuf) -> Result<Option<GpsFix>, PipelineError> {
    let Some(tags) = tokio::task::spawn_blocking(move || read_gps_tags(&path)).await? else {
        return Ok(None);
    };

    let dms = tags.to_dms_string();
    let fix = parse_dms(&dms)?;
    tracing::info!(
        dms = %dms,
        latitude = fix.latitude,
        longitude = fix.longitude,
        "GPS position extracted"
    );
    Ok(Some(fix))
}

async fn publish_file(
    storage: &dyn Storage,
    path: &std::path::Path,
    key: &str,
    format: PhotoFormat,
) -> Result<(), PipelineError> {
    upload_file(storage, path, key, format.content_type())
        .await
        .map_err(|source| PipelineError::Upload {
            bucket: storage.bucket().to_string(),
            key: key.to_string(),
            source,
        })?;
    tracing::debug!(bucket = %storage.bucket(), key, "Uploaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use geopix_db::InMemoryCatalog;
    use geopix_storage::MemoryStorage;

    struct Harness {
        uploads: MemoryStorage,
        finals: MemoryStorage,
        thumbnails: MemoryStorage,
        catalog: InMemoryCatalog,
        services: PhotoServices,
    }

    fn harness() -> Harness {
        let uploads = MemoryStorage::new("uploads");
        let finals = MemoryStorage::new("photos-final");
        let thumbnails = MemoryStorage::new("photos-thumbs");
        let catalog = InMemoryCatalog::new();
        let services = PhotoServices::new(
            Arc::new(uploads.clone()),
            Arc::new(finals.clone()),
            Arc::new(thumbnails.clone()),
            Arc::new(catalog.clone()),
        );
        Harness {
            uploads,
            finals,
            thumbnails,
            catalog,
            services,
        }
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!((actual - expected).abs() < 1e-5, "expected {expected}, got {actual}");
    }

    #[tokio::test]
    async fn test_jpeg_with_gps_is_published() {
        let h = harness();
        h.uploads.put_object(
            "photo.jpg",
            fixtures::photo(PhotoFormat::Jpeg, 320, 240, Some(fixtures::london_exif())),
        );
        let object = StorageObject::new("uploads", "photo.jpg", Some("image/jpeg"), 123);

        let outcome = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(h.finals.keys(), vec!["123.jpg"]);
        assert_eq!(h.thumbnails.keys(), vec!["thumb@64_123.jpg"]);
        assert!(!h.uploads.contains("photo.jpg"));

        let records = h.catalog.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.image_name, "123.jpg");
        assert_eq!(
            record.image_url,
            "https://storage.cloud.google.com/photos-final/123.jpg?authuser=1"
        );
        assert_eq!(
            record.thumb_url,
            "https://storage.cloud.google.com/photos-thumbs/thumb@64_123.jpg?authuser=1"
        );
        // 51:30:0.5 N, 0:7:34 W
        assert_close(record.latitude, 51.500139);
        assert_close(record.longitude, -0.126111);

        match outcome {
            ProcessOutcome::Published {
                record: published,
                thumbnail_name,
            } => {
                assert_eq!(&published, record);
                assert_eq!(thumbnail_name, "thumb@64_123.jpg");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let thumb = h.thumbnails.object("thumb@64_123.jpg").unwrap();
        let thumb = image::load_from_memory(&thumb).unwrap();
        assert_eq!(image::GenericImageView::dimensions(&thumb), (64, 48));
    }

    #[tokio::test]
    async fn test_non_photo_is_skipped_and_deleted() {
        let h = harness();
        h.uploads.put_object("doc.pdf", b"%PDF-1.4".to_vec());
        let object = StorageObject::new("uploads", "doc.pdf", Some("application/pdf"), 9);

        let outcome = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Skipped {
                content_type: Some("application/pdf".to_string())
            }
        );
        assert_eq!(h.uploads.download_count(), 0);
        assert!(h.catalog.is_empty());
        assert!(h.finals.keys().is_empty());
        assert!(h.thumbnails.keys().is_empty());
        assert!(!h.uploads.contains("doc.pdf"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_skipped() {
        let h = harness();
        h.uploads.put_object("blob", vec![1, 2, 3]);
        let object = StorageObject::new("uploads", "blob", None, 1);

        let outcome = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::Skipped { content_type: None });
        assert!(!h.uploads.contains("blob"));
    }

    #[tokio::test]
    async fn test_redelivered_skip_with_source_already_deleted() {
        let h = harness();
        let object = StorageObject::new("uploads", "doc.pdf", Some("application/pdf"), 9);

        let outcome = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProcessOutcome::Skipped {
                content_type: Some("application/pdf".to_string())
            }
        );
        assert!(h.uploads.keys().is_empty());
    }

    #[tokio::test]
    async fn test_png_without_gps_stores_null_position() {
        let h = harness();
        h.uploads
            .put_object("shot.png", fixtures::photo(PhotoFormat::Png, 50, 100, None));
        let object = StorageObject::new("uploads", "shot.png", Some("image/png"), 77);

        process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(h.finals.keys(), vec!["77.png"]);
        assert_eq!(h.thumbnails.keys(), vec!["thumb@64_77.png"]);
        let records = h.catalog.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].longitude, None);
    }

    #[tokio::test]
    async fn test_malformed_gps_reference_is_fatal_and_source_deleted() {
        let h = harness();
        let exif = fixtures::gps_exif(&[(10, 1), (0, 1), (0, 1)], "X", &[(20, 1), (0, 1), (0, 1)], "E");
        h.uploads
            .put_object("odd.jpg", fixtures::photo(PhotoFormat::Jpeg, 64, 64, Some(exif)));
        let object = StorageObject::new("uploads", "odd.jpg", Some("image/jpeg"), 5);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Coordinates(_)));
        assert!(h.catalog.is_empty());
        assert!(h.finals.keys().is_empty());
        assert!(!h.uploads.contains("odd.jpg"));
    }

    #[tokio::test]
    async fn test_upload_failure_still_deletes_source() {
        let h = harness();
        h.finals.set_fail_uploads(true);
        h.uploads
            .put_object("photo.jpg", fixtures::photo(PhotoFormat::Jpeg, 64, 64, None));
        let object = StorageObject::new("uploads", "photo.jpg", Some("image/jpeg"), 10);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upload { ref key, .. } if key == "10.jpg"));
        assert!(h.catalog.is_empty());
        assert!(!h.uploads.contains("photo.jpg"));
    }

    #[tokio::test]
    async fn test_missing_source_object_fails_download() {
        let h = harness();
        let object = StorageObject::new("uploads", "gone.png", Some("image/png"), 11);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Download { .. }));
        assert!(h.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_after_success_is_returned() {
        let h = harness();
        h.uploads.set_fail_deletes(true);
        h.uploads
            .put_object("photo.png", fixtures::photo(PhotoFormat::Png, 64, 32, None));
        let object = StorageObject::new("uploads", "photo.png", Some("image/png"), 12);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Delete { .. }));
        assert_eq!(h.catalog.len(), 1);
        assert!(h.uploads.contains("photo.png"));
    }

    #[tokio::test]
    async fn test_pipeline_error_wins_over_delete_failure() {
        let h = harness();
        h.uploads.set_fail_deletes(true);
        h.thumbnails.set_fail_uploads(true);
        h.uploads
            .put_object("photo.png", fixtures::photo(PhotoFormat::Png, 64, 32, None));
        let object = StorageObject::new("uploads", "photo.png", Some("image/png"), 13);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upload { ref bucket, .. } if bucket == "photos-thumbs"));
    }

    #[tokio::test]
    async fn test_same_generation_twice_creates_two_records() {
        let h = harness();
        let data = fixtures::photo(PhotoFormat::Jpeg, 64, 64, None);
        let object = StorageObject::new("uploads", "photo.jpg", Some("image/jpeg"), 123);

        for _ in 0..2 {
            h.uploads.put_object("photo.jpg", data.clone());
            process_upload(&h.services, &PipelineSettings::default(), &object)
                .await
                .unwrap();
        }

        let records = h.catalog.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_name, records[1].image_name);
        assert_ne!(records[0].id, records[1].id);
    }

    #[tokio::test]
    async fn test_custom_width_and_host() {
        let h = harness();
        h.uploads
            .put_object("wide.jpg", fixtures::photo(PhotoFormat::Jpeg, 400, 100, None));
        let object = StorageObject::new("uploads", "wide.jpg", Some("image/jpeg"), 8);
        let settings = PipelineSettings {
            public_url_host: "cdn.example.com/".to_string(),
            thumbnail_width: 128,
            revision: Some("geopix-00042".to_string()),
        };

        process_upload(&h.services, &settings, &object).await.unwrap();

        assert_eq!(h.thumbnails.keys(), vec!["thumb@128_8.jpg"]);
        assert_eq!(
            h.catalog.records()[0].thumb_url,
            "https://cdn.example.com/photos-thumbs/thumb@128_8.jpg?authuser=1"
        );
    }

    fn leftover_working_dirs(generation: u64) -> usize {
        let prefix = format!("{}-{}-", WORKING_DIR_PREFIX, generation);
        std::fs::read_dir(std::env::temp_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .count()
    }

    #[tokio::test]
    async fn test_working_directory_removed_after_success() {
        let h = harness();
        h.uploads.put_object(
            "photo.jpg",
            fixtures::photo(PhotoFormat::Jpeg, 64, 64, Some(fixtures::london_exif())),
        );
        let object = StorageObject::new("uploads", "photo.jpg", Some("image/jpeg"), 987654320);

        process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(leftover_working_dirs(987654320), 0);
    }

    #[tokio::test]
    async fn test_working_directory_removed_after_upload_failure() {
        let h = harness();
        h.thumbnails.set_fail_uploads(true);
        h.uploads
            .put_object("photo.png", fixtures::photo(PhotoFormat::Png, 64, 64, None));
        let object = StorageObject::new("uploads", "photo.png", Some("image/png"), 987654321);

        let err = process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Upload { .. }));
        assert_eq!(leftover_working_dirs(987654321), 0);
    }

    #[tokio::test]
    async fn test_working_directory_removed_after_download_failure() {
        let h = harness();
        let object = StorageObject::new("uploads", "absent.jpg", Some("image/jpeg"), 987654322);

        process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap_err();

        assert_eq!(leftover_working_dirs(987654322), 0);
    }

    #[tokio::test]
    async fn test_png_labelled_as_jpeg_is_published_as_jpeg() {
        let h = harness();
        h.uploads
            .put_object("photo.jpg", fixtures::photo(PhotoFormat::Png, 128, 64, None));
        let object = StorageObject::new("uploads", "photo.jpg", Some("image/jpeg"), 5);

        process_upload(&h.services, &PipelineSettings::default(), &object)
            .await
            .unwrap();

        assert_eq!(h.finals.keys(), vec!["5.jpg"]);
        let thumb = h.thumbnails.object("thumb@64_5.jpg").unwrap();
        assert_eq!(image::guess_format(&thumb).unwrap(), image::ImageFormat::Jpeg);
        assert_eq!(h.catalog.len(), 1);
        assert!(!h.uploads.contains("photo.jpg"));
    }

    #[test]
    fn test_pipeline_errors_map_to_app_errors() {
        let err: AppError = PipelineError::Coordinates(DmsError::Malformed("x".into())).into();
        assert!(matches!(err, AppError::InvalidMetadata(_)));

        let err: AppError = PipelineError::Thumbnail(ThumbnailError::InvalidWidth).into();
        assert!(matches!(err, AppError::ImageProcessing(_)));

        let err: AppError = PipelineError::Catalog(AppError::NotFound("photos".into())).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
