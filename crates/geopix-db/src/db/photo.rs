//! Photo repository: inserts into the `photos` table.

use geopix_core::constants::PHOTOS_COLLECTION;
use geopix_core::{AppError, NewPhotoRecord, PhotoRecord};
use sqlx::{PgPool, Postgres};

/// Repository for the photos table.
#[derive(Clone)]
pub struct PhotoRepository {
    pool: PgPool,
}

impl PhotoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a catalog record and return it with its generated id.
    #[tracing::instrument(skip(self, record), fields(db.table = PHOTOS_COLLECTION, image_name = %record.image_name))]
    pub async fn create(&self, record: NewPhotoRecord) -> Result<PhotoRecord, AppError> {
        let row: PhotoRecord = sqlx::query_as::<Postgres, PhotoRecord>(
            r#"
            INSERT INTO photos (image_name, image_url, thumb_url, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, image_name, image_url, thumb_url, latitude, longitude, created_at
            "#,
        )
        .bind(&record.image_name)
        .bind(&record.image_url)
        .bind(&record.thumb_url)
        .bind(record.latitude)
        .bind(record.longitude)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(record_id = %row.id, "Photo record inserted");
        Ok(row)
    }
}
