//! Degrees-minutes-seconds coordinates.
//!
//! The textual form is two axes separated by whitespace, each `D:M:S` followed by a hemisphere
//! reference, for example `51:30:0.5486N 0:7:34.4503W`. One axis must be north/south and the
//! other east/west; they may appear in either order. Southern and western values are negative.
//! Hemisphere letters are case-insensitive; minutes and seconds must be below 60.
//!
//! The decimal value is `degrees + minutes / 60 + seconds / 3600`, so `51:30:0.5486N` is about
//! 51.500152 and `51:30:30.546N` is about 51.508485.

use geopix_core::GpsFix;
use regex::Regex;

const AXIS_PATTERN: &str = r"(\d+(?:\.\d+)?):(\d+(?:\.\d+)?):(\d+(?:\.\d+)?)([NSEWnsew])";

#[derive(Debug, thiserror::Error)]
pub enum DmsError {
    #[error("malformed DMS coordinates: {0:?}")]
    Malformed(String),

    #[error("DMS coordinates need one N/S and one E/W axis: {0:?}")]
    AxisMismatch(String),

    #[error("{axis} {value} is out of range")]
    OutOfRange { axis: &'static str, value: f64 },

    #[error("DMS pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Parse a DMS coordinate pair into a decimal fix.
pub fn parse_dms(input: &str) -> Result<GpsFix, DmsError> {
    let pattern = Regex::new(&format!(r"^\s*{AXIS_PATTERN}\s+{AXIS_PATTERN}\s*$"))?;
    let caps = pattern
        .captures(input)
        .ok_or_else(|| DmsError::Malformed(input.to_string()))?;

    let axis = |offset: usize| -> Result<(f64, char), DmsError> {
        let number = |i: usize| {
            caps[offset + i]
                .parse::<f64>()
                .map_err(|_| DmsError::Malformed(input.to_string()))
        };
        let (minutes, seconds) = (number(2)?, number(3)?);
        if minutes >= 60.0 {
            return Err(DmsError::OutOfRange {
                axis: "minutes",
                value: minutes,
            });
        }
        if seconds >= 60.0 {
            return Err(DmsError::OutOfRange {
                axis: "seconds",
                value: seconds,
            });
        }
        let decimal = number(1)? + minutes / 60.0 + seconds / 3600.0;
        let reference = caps[offset + 4]
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .ok_or_else(|| DmsError::Malformed(input.to_string()))?;
        Ok((decimal, reference))
    };

    let first = axis(0)?;
    let second = axis(4)?;

    let (latitude, longitude) = match (first.1, second.1) {
        ('N' | 'S', 'E' | 'W') => (first, second),
        ('E' | 'W', 'N' | 'S') => (second, first),
        _ => return Err(DmsError::AxisMismatch(input.to_string())),
    };

    let latitude = signed(latitude);
    let longitude = signed(longitude);

    if latitude.abs() > 90.0 {
        return Err(DmsError::OutOfRange {
            axis: "latitude",
            value: latitude,
        });
    }
    if longitude.abs() > 180.0 {
        return Err(DmsError::OutOfRange {
            axis: "longitude",
            value: longitude,
        });
    }

    Ok(GpsFix {
        latitude,
        longitude,
    })
}

fn signed((value, reference): (f64, char)) -> f64 {
    match reference {
        'S' | 'W' => -value,
        _ => value,
    }
}

/// Render a decimal fix in DMS form, latitude first, seconds rounded to four decimals.
pub fn format_dms(fix: &GpsFix) -> String {
    let latitude_ref = if fix.latitude < 0.0 { 'S' } else { 'N' };
    let longitude_ref = if fix.longitude < 0.0 { 'W' } else { 'E' };
    format!(
        "{}{} {}{}",
        format_axis(fix.latitude),
        latitude_ref,
        format_axis(fix.longitude),
        longitude_ref
    )
}

/// Ten-thousandths of an arc second
const TICKS_PER_SECOND: u64 = 10_000;

fn format_axis(value: f64) -> String {
    let ticks = (value.abs() * 3600.0 * TICKS_PER_SECOND as f64).round() as u64;
    let degrees = ticks / (3600 * TICKS_PER_SECOND);
    let minutes = (ticks / (60 * TICKS_PER_SECOND)) % 60;
    let seconds = (ticks % (60 * TICKS_PER_SECOND)) as f64 / TICKS_PER_SECOND as f64;
    format!("{}:{}:{}", degrees, minutes, seconds)
}
