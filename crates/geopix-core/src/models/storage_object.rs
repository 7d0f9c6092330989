//! Storage notification payload.
//!
//! Object-storage notifications encode 64-bit counters (`generation`, `metageneration`, `size`)
//! as JSON strings; hand-written test payloads often use plain numbers. Both are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reference to the uploaded object that triggered an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    /// Bucket the object was written to.
    pub bucket: String,
    /// Object name (key) inside the bucket.
    pub name: String,
    /// Declared media type. Absent when the uploader did not set one.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Version number assigned by the storage system to this write of the object.
    #[serde(deserialize_with = "deserialize_u64")]
    pub generation: u64,
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    pub metageneration: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    pub size: Option<u64>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub id: Option<String>,
}

impl StorageObject {
    pub fn new(
        bucket: impl Into<String>,
        name: impl Into<String>,
        content_type: Option<&str>,
        generation: u64,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
            content_type: content_type.map(String::from),
            generation,
            metageneration: None,
            size: None,
            time_created: None,
            id: None,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Number(u64),
    String(String),
}

impl StringOrNumber {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            StringOrNumber::Number(n) => Ok(n),
            StringOrNumber::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an unsigned integer, got '{}'", s))),
        }
    }
}

fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer)?.into_u64()
}

fn deserialize_optional_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_u64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_notification_with_string_counters() {
        let payload = json!({
            "bucket": "photos-uploads",
            "name": "photo.jpg",
            "contentType": "image/jpeg",
            "generation": "1712345678901234",
            "metageneration": "1",
            "size": "20480",
            "timeCreated": "2024-04-05T12:00:00.000Z"
        });

        let object: StorageObject = serde_json::from_value(payload).unwrap();
        assert_eq!(object.bucket, "photos-uploads");
        assert_eq!(object.name, "photo.jpg");
        assert_eq!(object.content_type(), Some("image/jpeg"));
        assert_eq!(object.generation, 1712345678901234);
        assert_eq!(object.metageneration, Some(1));
        assert_eq!(object.size, Some(20480));
        assert!(object.time_created.is_some());
    }

    #[test]
    fn test_deserialize_minimal_notification_with_numeric_generation() {
        let payload = json!({
            "bucket": "photos-uploads",
            "name": "doc.pdf",
            "generation": 123
        });

        let object: StorageObject = serde_json::from_value(payload).unwrap();
        assert_eq!(object.generation, 123);
        assert_eq!(object.content_type(), None);
        assert_eq!(object.size, None);
    }

    #[test]
    fn test_rejects_non_numeric_generation() {
        let payload = json!({
            "bucket": "photos-uploads",
            "name": "photo.jpg",
            "generation": "../etc"
        });

        assert!(serde_json::from_value::<StorageObject>(payload).is_err());
    }

    #[test]
    fn test_missing_generation_is_rejected() {
        let payload = json!({ "bucket": "b", "name": "n" });
        assert!(serde_json::from_value::<StorageObject>(payload).is_err());
    }
}
