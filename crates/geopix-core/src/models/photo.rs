use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Decimal GPS position in degrees. South and west are negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
}

/// Catalog entry as written by the pipeline, before the store assigns an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhotoRecord {
    pub image_name: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "thumbURL")]
    pub thumb_url: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewPhotoRecord {
    pub fn new(
        image_name: String,
        image_url: String,
        thumb_url: String,
        gps: Option<GpsFix>,
    ) -> Self {
        Self {
            image_name,
            image_url,
            thumb_url,
            latitude: gps.map(|g| g.latitude),
            longitude: gps.map(|g| g.longitude),
        }
    }
}

/// Persisted catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: Uuid,
    pub image_name: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "thumbURL")]
    pub thumb_url: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl PhotoRecord {
    pub fn gps(&self) -> Option<GpsFix> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GpsFix {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}
