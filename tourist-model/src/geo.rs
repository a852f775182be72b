use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{ModelError, Result};

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// A validated WGS84 coordinate.
///
/// Fields are private so a coordinate can never leave the valid range once
/// constructed; pins rely on this to keep their position immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCoordinate"))]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ModelError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && LATITUDE_RANGE.contains(&latitude)
            && LONGITUDE_RANGE.contains(&longitude);

        if !valid {
            return Err(ModelError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Rectangular search window, in degrees, clamped to the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Build a window of `half_width` degrees of longitude and `half_height`
    /// degrees of latitude on either side of `center`.
    ///
    /// Edges are clamped independently, so a window near a pole or the
    /// antimeridian shrinks instead of wrapping.
    pub fn around(
        center: Coordinate,
        half_width: f64,
        half_height: f64,
    ) -> Self {
        let (lon_lo, lon_hi) =
            (*LONGITUDE_RANGE.start(), *LONGITUDE_RANGE.end());
        let (lat_lo, lat_hi) = (*LATITUDE_RANGE.start(), *LATITUDE_RANGE.end());

        Self {
            min_lon: (center.longitude - half_width).clamp(lon_lo, lon_hi),
            min_lat: (center.latitude - half_height).clamp(lat_lo, lat_hi),
            max_lon: (center.longitude + half_width).clamp(lon_lo, lon_hi),
            max_lat: (center.latitude + half_height).clamp(lat_lo, lat_hi),
        }
    }

    /// `min_lon,min_lat,max_lon,max_lat`, the order the search API expects.
    pub fn to_query_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_param())
    }
}
