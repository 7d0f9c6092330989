//! Content-type gate for the pipeline.

use image::ImageFormat;
use std::fmt;

/// Photo container formats the pipeline publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
}

impl PhotoFormat {
    /// Map a declared content type to a photo format.
    ///
    /// Matching is exact: parameters (`image/jpeg; q=1`), case variants and absent types are
    /// all rejected with `None`.
    pub fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        match content_type? {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// File extension used for published object names
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    /// Final object name: `<generation>.<ext>`
    pub fn object_name(&self, generation: u64) -> String {
        format!("{}.{}", generation, self.extension())
    }
}

impl fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_content_types() {
        assert_eq!(
            PhotoFormat::from_content_type(Some("image/jpeg")),
            Some(PhotoFormat::Jpeg)
        );
        assert_eq!(
            PhotoFormat::from_content_type(Some("image/png")),
            Some(PhotoFormat::Png)
        );
    }

    #[test]
    fn test_rejected_content_types() {
        for content_type in [
            "application/pdf",
            "image/gif",
            "image/webp",
            "image/jpg",
            "IMAGE/JPEG",
            "image/jpeg; charset=binary",
            " image/png",
            "",
        ] {
            assert_eq!(
                PhotoFormat::from_content_type(Some(content_type)),
                None,
                "{content_type:?} should be rejected"
            );
        }
        assert_eq!(PhotoFormat::from_content_type(None), None);
    }

    #[test]
    fn test_object_names_use_extension_mapping() {
        assert_eq!(PhotoFormat::Jpeg.object_name(123), "123.jpg");
        assert_eq!(PhotoFormat::Png.object_name(1700000000000001), "1700000000000001.png");
    }
}
