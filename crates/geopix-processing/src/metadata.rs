//! EXIF GPS extraction.
//!
//! The EXIF block is pulled out of the container with `img-parts` (JPEG APP1 or PNG eXIf) and
//! parsed with `kamadak-exif`. Extraction failures are never fatal to the pipeline:
//! [`read_gps_tags`] logs them and reports no position.

use bytes::Bytes;
use exif::{Exif, In, Reader, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;
use std::path::Path;

const EXIF_IDENTIFIER: &[u8] = b"Exif\0\0";

#[derive(Debug, thiserror::Error)]
pub enum ExifError {
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image container")]
    UnsupportedContainer,

    #[error("image has no EXIF block")]
    Missing,

    #[error("corrupt EXIF block: {0}")]
    Parse(#[from] exif::Error),
}

/// Raw GPS tags from an EXIF block, one degrees/minutes/seconds triple per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTags {
    pub latitude: [f64; 3],
    pub latitude_ref: String,
    pub longitude: [f64; 3],
    pub longitude_ref: String,
}

impl GpsTags {
    /// `D:M:S<REF> D:M:S<REF>`, latitude first
    pub fn to_dms_string(&self) -> String {
        let [lat_d, lat_m, lat_s] = self.latitude;
        let [lon_d, lon_m, lon_s] = self.longitude;
        format!(
            "{}:{}:{}{} {}:{}:{}{}",
            lat_d, lat_m, lat_s, self.latitude_ref, lon_d, lon_m, lon_s, self.longitude_ref
        )
    }
}

/// Return the TIFF-structured EXIF payload of a JPEG or PNG image.
pub fn extract_exif_block(data: &[u8]) -> Result<Bytes, ExifError> {
    let bytes = Bytes::copy_from_slice(data);
    let block = if let Ok(jpeg) = Jpeg::from_bytes(bytes.clone()) {
        jpeg.exif()
    } else if let Ok(png) = Png::from_bytes(bytes) {
        png.exif()
    } else {
        return Err(ExifError::UnsupportedContainer);
    };

    let block = block.ok_or(ExifError::Missing)?;
    if block.starts_with(EXIF_IDENTIFIER) {
        Ok(block.slice(EXIF_IDENTIFIER.len()..))
    } else {
        Ok(block)
    }
}

/// Read the GPS tags of an image file.
///
/// `Ok(None)` means the EXIF block parsed but carries no complete position.
pub fn try_read_gps_tags(path: &Path) -> Result<Option<GpsTags>, ExifError> {
    let data = std::fs::read(path)?;
    let block = extract_exif_block(&data)?;
    let exif = Reader::new().read_raw(block.to_vec())?;

    Ok(gps_tags(&exif))
}

/// Read the GPS tags of an image file, treating every failure as "no position".
pub fn read_gps_tags(path: &Path) -> Option<GpsTags> {
    match try_read_gps_tags(path) {
        Ok(Some(tags)) => Some(tags),
        Ok(None) => {
            tracing::info!(path = %path.display(), "EXIF has no complete GPS position");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read EXIF metadata");
            None
        }
    }
}

fn gps_tags(exif: &Exif) -> Option<GpsTags> {
    Some(GpsTags {
        latitude: rational_triple(exif, Tag::GPSLatitude)?,
        latitude_ref: ascii_value(exif, Tag::GPSLatitudeRef)?,
        longitude: rational_triple(exif, Tag::GPSLongitude)?,
        longitude_ref: ascii_value(exif, Tag::GPSLongitudeRef)?,
    })
}

fn rational_triple(exif: &Exif, tag: Tag) -> Option<[f64; 3]> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(parts) if parts.len() >= 3 => {
            let triple = [parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64()];
            triple.iter().all(|v| v.is_finite()).then_some(triple)
        }
        _ => None,
    }
}

fn ascii_value(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).trim().to_string())
            .filter(|v| !v.is_empty()),
        _ => None,
    }
}
