//! Normalization of raw listing positions into latitude/longitude.
//!
//! The listing service is inconsistent about coordinate encoding: most
//! records carry decimal degrees (`"126.9780"`), some carry a fixed-point
//! integer scaled by 10^7 (`"1269780000"`). [`classify`] decides which form
//! a pair is in, [`convert`] turns it into degrees, and [`normalize`] runs
//! both and re-checks the result against the Korean peninsula bounding box.
//!
//! Arguments are always `(x, y)`, i.e. `(mapx, mapy)` = `(longitude, latitude)`.

use serde::Serialize;

pub const LNG_MIN: f64 = 124.0;
pub const LNG_MAX: f64 = 132.0;
pub const LAT_MIN: f64 = 33.0;
pub const LAT_MAX: f64 = 43.0;

/// Both components must exceed this magnitude to be read as fixed-point.
pub const FIXED_POINT_THRESHOLD: f64 = 1_000_000.0;
pub const FIXED_POINT_SCALE: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Encoding of a raw coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateFormat {
    /// Decimal degrees already inside the bounding box.
    AlreadyNormalized { x: f64, y: f64 },
    /// Integers scaled by [`FIXED_POINT_SCALE`].
    FixedPointEncoded { x: f64, y: f64 },
    /// Empty, zero, non-numeric, or an unknown magnitude pattern.
    Unrecognized,
}

fn parse_component(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() || value == 0.0 {
        return None;
    }
    Some(value)
}

fn in_bounds(x: f64, y: f64) -> bool {
    (LNG_MIN..=LNG_MAX).contains(&x) && (LAT_MIN..=LAT_MAX).contains(&y)
}

/// Classifies a raw `(x, y)` pair by magnitude.
#[must_use]
pub fn classify(x: Option<&str>, y: Option<&str>) -> CoordinateFormat {
    let (Some(x), Some(y)) = (parse_component(x), parse_component(y)) else {
        return CoordinateFormat::Unrecognized;
    };

    if in_bounds(x, y) {
        CoordinateFormat::AlreadyNormalized { x, y }
    } else if x.abs() > FIXED_POINT_THRESHOLD && y.abs() > FIXED_POINT_THRESHOLD {
        CoordinateFormat::FixedPointEncoded { x, y }
    } else {
        CoordinateFormat::Unrecognized
    }
}

/// Converts a classified pair into degrees. Performs no range check.
#[must_use]
pub fn convert(format: CoordinateFormat) -> Option<Coordinates> {
    match format {
        CoordinateFormat::AlreadyNormalized { x, y } => Some(Coordinates {
            latitude: y,
            longitude: x,
        }),
        CoordinateFormat::FixedPointEncoded { x, y } => Some(Coordinates {
            latitude: y / FIXED_POINT_SCALE,
            longitude: x / FIXED_POINT_SCALE,
        }),
        CoordinateFormat::Unrecognized => None,
    }
}

/// Normalizes a raw `(x, y)` pair, returning `None` when no valid position
/// inside the bounding box can be recovered.
#[must_use]
pub fn normalize(x: Option<&str>, y: Option<&str>) -> Option<Coordinates> {
    convert(classify(x, y)).filter(|c| in_bounds(c.longitude, c.latitude))
}
