//! Test photos with hand-built EXIF blocks.

use crate::validator::PhotoFormat;
use bytes::Bytes;
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, Rgb, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::png::Png;
use img_parts::ImageEXIF;
use std::io::Cursor;

fn rationals(parts: &[(u32, u32)]) -> Value {
    Value::Rational(
        parts
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// Serialize fields into a TIFF-structured EXIF block
pub fn exif_block(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// GPS block with arbitrary references
pub fn gps_exif(
    latitude: &[(u32, u32)],
    latitude_ref: &str,
    longitude: &[(u32, u32)],
    longitude_ref: &str,
) -> Vec<u8> {
    exif_block(&[
        field(Tag::GPSLatitudeRef, ascii(latitude_ref)),
        field(Tag::GPSLatitude, rationals(latitude)),
        field(Tag::GPSLongitudeRef, ascii(longitude_ref)),
        field(Tag::GPSLongitude, rationals(longitude)),
    ])
}

/// 51:30:0.5 N, 0:7:34 W
pub fn london_exif() -> Vec<u8> {
    gps_exif(&[(51, 1), (30, 1), (1, 2)], "N", &[(0, 1), (7, 1), (34, 1)], "W")
}

/// EXIF block carrying only an orientation tag
pub fn orientation_exif(orientation: u16) -> Vec<u8> {
    exif_block(&[field(Tag::Orientation, Value::Short(vec![orientation]))])
}

/// Encode a solid-colour photo and optionally embed an EXIF block
pub fn photo(format: PhotoFormat, width: u32, height: u32, exif: Option<Vec<u8>>) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 80, 40])));
    let mut encoded = Vec::new();
    img.write_to(&mut Cursor::new(&mut encoded), format.image_format())
        .unwrap();

    let Some(exif) = exif else {
        return encoded;
    };

    let exif = Some(Bytes::from(exif));
    match format {
        PhotoFormat::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::from(encoded)).unwrap();
            jpeg.set_exif(exif);
            jpeg.encoder().bytes().to_vec()
        }
        PhotoFormat::Png => {
            let mut png = Png::from_bytes(Bytes::from(encoded)).unwrap();
            png.set_exif(exif);
            png.encoder().bytes().to_vec()
        }
    }
}
