//! Fixed-width thumbnails.
//!
//! Thumbnails keep the source aspect ratio and format, and carry the source EXIF block so
//! orientation and GPS survive the resize.

use crate::metadata::extract_exif_block;
use crate::validator::PhotoFormat;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("thumbnail width must be positive")]
    InvalidWidth,

    #[error("thumbnail file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to embed EXIF metadata: {0}")]
    Metadata(String),
}

/// Result of a thumbnail run
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailInfo {
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub exif_preserved: bool,
}

/// Thumbnail object name: `thumb@<width>_<generation>.<ext>`
pub fn thumbnail_name(width: u32, generation: u64, format: PhotoFormat) -> String {
    format!("thumb@{}_{}", width, format.object_name(generation))
}

/// Target dimensions for a resize to `target_width`, rounding the height and never going below 1.
pub fn thumbnail_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let scaled = (height as f64 * target_width as f64 / width.max(1) as f64).round();
    (target_width, scaled.max(1.0) as u32)
}

/// Resize the image at `source` to `target_width` and write it to `dest` as `format`.
///
/// The source is decoded by sniffing its bytes, so a mislabelled upload still converts.
pub fn generate_thumbnail(
    source: &Path,
    dest: &Path,
    format: PhotoFormat,
    target_width: u32,
) -> Result<ThumbnailInfo, ThumbnailError> {
    if target_width == 0 {
        return Err(ThumbnailError::InvalidWidth);
    }

    let data = std::fs::read(source)?;
    let img = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()?
        .decode()?;
    let (width, height) = img.dimensions();
    let (thumb_width, thumb_height) = thumbnail_dimensions(width, height, target_width);

    let resized = img.resize_exact(thumb_width, thumb_height, FilterType::Lanczos3);
    // JPEG cannot carry alpha
    let resized = match format {
        PhotoFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        PhotoFormat::Png => resized,
    };

    let mut encoded = Vec::new();
    resized.write_to(&mut Cursor::new(&mut encoded), format.image_format())?;

    let exif = extract_exif_block(&data).ok();
    let exif_preserved = exif.is_some();
    let output = match exif {
        Some(block) => embed_exif(encoded, block, format)?,
        None => encoded,
    };

    std::fs::write(dest, &output)?;

    tracing::debug!(
        width = thumb_width,
        height = thumb_height,
        size_bytes = output.len(),
        exif_preserved,
        "Thumbnail generated"
    );

    Ok(ThumbnailInfo {
        width: thumb_width,
        height: thumb_height,
        size_bytes: output.len() as u64,
        exif_preserved,
    })
}

fn embed_exif(encoded: Vec<u8>, block: Bytes, format: PhotoFormat) -> Result<Vec<u8>, ThumbnailError> {
    let encoded = Bytes::from(encoded);
    let output = match format {
        PhotoFormat::Jpeg => {
            let mut jpeg =
                Jpeg::from_bytes(encoded).map_err(|e| ThumbnailError::Metadata(e.to_string()))?;
            jpeg.set_exif(Some(block));
            jpeg.encoder().bytes()
        }
        PhotoFormat::Png => {
            let mut png =
                Png::from_bytes(encoded).map_err(|e| ThumbnailError::Metadata(e.to_string()))?;
            png.set_exif(Some(block));
            png.encoder().bytes()
        }
    };
    Ok(output.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::metadata::try_read_gps_tags;
    use exif::{In, Reader, Tag};

    fn run(
        format: PhotoFormat,
        width: u32,
        height: u32,
        exif: Option<Vec<u8>>,
    ) -> (tempfile::TempDir, std::path::PathBuf, ThumbnailInfo) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("thumb");
        std::fs::write(&source, fixtures::photo(format, width, height, exif)).unwrap();
        let info = generate_thumbnail(&source, &dest, format, 64).unwrap();
        (dir, dest, info)
    }

    #[test]
    fn test_thumbnail_name() {
        assert_eq!(thumbnail_name(64, 123, PhotoFormat::Jpeg), "thumb@64_123.jpg");
        assert_eq!(thumbnail_name(128, 7, PhotoFormat::Png), "thumb@128_7.png");
    }

    #[test]
    fn test_dimensions_preserve_aspect_ratio() {
        assert_eq!(thumbnail_dimensions(640, 480, 64), (64, 48));
        assert_eq!(thumbnail_dimensions(100, 33, 64), (64, 21));
        assert_eq!(thumbnail_dimensions(1000, 3, 64), (64, 1));
        assert_eq!(thumbnail_dimensions(32, 32, 64), (64, 64));
    }

    #[test]
    fn test_jpeg_thumbnail_keeps_format_and_ratio() {
        let (_dir, dest, info) = run(PhotoFormat::Jpeg, 200, 100, None);

        assert_eq!((info.width, info.height), (64, 32));
        assert!(!info.exif_preserved);

        let data = std::fs::read(&dest).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), image::ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (64, 32));
        assert_eq!(info.size_bytes, data.len() as u64);
    }

    #[test]
    fn test_png_thumbnail_keeps_format() {
        let (_dir, dest, info) = run(PhotoFormat::Png, 80, 160, None);

        assert_eq!((info.width, info.height), (64, 128));
        let data = std::fs::read(&dest).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), image::ImageFormat::Png);
    }

    #[test]
    fn test_exif_is_copied_to_thumbnail() {
        let (_dir, dest, info) = run(PhotoFormat::Jpeg, 128, 96, Some(fixtures::london_exif()));

        assert!(info.exif_preserved);
        let tags = try_read_gps_tags(&dest).unwrap().unwrap();
        assert_eq!(tags.to_dms_string(), "51:30:0.5N 0:7:34W");
    }

    #[test]
    fn test_orientation_is_copied_to_png_thumbnail() {
        let (_dir, dest, _) = run(PhotoFormat::Png, 96, 64, Some(fixtures::orientation_exif(6)));

        let data = std::fs::read(&dest).unwrap();
        let block = extract_exif_block(&data).unwrap();
        let exif = Reader::new().read_raw(block.to_vec()).unwrap();
        let orientation = exif.get_field(Tag::Orientation, In::PRIMARY).unwrap();
        assert_eq!(orientation.value.get_uint(0), Some(6));
    }

    #[test]
    fn test_mislabelled_png_is_written_as_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let dest = dir.path().join("thumb");
        std::fs::write(&source, fixtures::photo(PhotoFormat::Png, 128, 128, None)).unwrap();

        let info = generate_thumbnail(&source, &dest, PhotoFormat::Jpeg, 64).unwrap();

        assert_eq!((info.width, info.height), (64, 64));
        let data = std::fs::read(&dest).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn test_corrupt_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, b"\xFF\xD8 definitely not a jpeg").unwrap();

        let result = generate_thumbnail(&source, &dir.path().join("out"), PhotoFormat::Jpeg, 64);

        assert!(matches!(result, Err(ThumbnailError::Image(_))));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = generate_thumbnail(
            &dir.path().join("a"),
            &dir.path().join("b"),
            PhotoFormat::Png,
            0,
        );
        assert!(matches!(result, Err(ThumbnailError::InvalidWidth)));
    }
}
