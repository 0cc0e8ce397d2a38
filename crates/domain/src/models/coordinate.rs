//! Coordinate value type.

use serde::{Deserialize, Serialize};
use validator::ValidationError;

/// A WGS84 position in degrees, treated as planar for containment purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without range checks.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a coordinate, rejecting out-of-range or non-finite values.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        shared::validation::validate_latitude(latitude)?;
        shared::validation::validate_longitude(longitude)?;
        Ok(Self::new(latitude, longitude))
    }

    /// Builds a coordinate from a GeoJSON position (`[longitude, latitude]`).
    pub fn from_position(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }

    /// Returns the GeoJSON position (`[longitude, latitude]`).
    pub fn to_position(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}
