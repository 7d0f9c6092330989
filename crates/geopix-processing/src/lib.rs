//! Geopix Photo Processing Library
//!
//! This crate provides the steps of the photo upload pipeline: content-type validation,
//! EXIF GPS extraction, DMS coordinate parsing, thumbnail generation, and the
//! [`process_upload`] flow that ties them to storage and the catalog.

pub mod dms;
pub mod metadata;
pub mod pipeline;
pub mod thumbnail;
pub mod validator;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use dms::{format_dms, parse_dms, DmsError};
pub use metadata::{read_gps_tags, ExifError, GpsTags};
pub use pipeline::{
    process_upload, PhotoServices, PipelineError, PipelineSettings, ProcessOutcome,
};
pub use thumbnail::{generate_thumbnail, thumbnail_name, ThumbnailError, ThumbnailInfo};
pub use validator::PhotoFormat;
