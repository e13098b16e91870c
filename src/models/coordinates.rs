//! Coordinates model for geographic positions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geographic coordinates as resolved from a zip code
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    /// Create new coordinates
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// The coordinates as a `(latitude, longitude)` pair
    #[must_use]
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A geopoint is `[latitude, longitude]`
impl From<[f64; 2]> for Coordinates {
    fn from(geopoint: [f64; 2]) -> Self {
        Self::new(geopoint[0], geopoint[1])
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
