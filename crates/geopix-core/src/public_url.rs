//! Public catalog URLs.
//!
//! Catalog entries carry browser-addressable URLs of the form
//! `https://{host}/{bucket}/{object}?authuser=1`, independent of the backend the object was
//! written with.

use crate::constants::PUBLIC_URL_QUERY;

/// Build the public URL of `object_name` inside `bucket`.
pub fn public_object_url(host: &str, bucket: &str, object_name: &str) -> String {
    format!(
        "https://{}/{}/{}?{}",
        host.trim_end_matches('/'),
        bucket,
        object_name,
        PUBLIC_URL_QUERY
    )
}
