use haversine::{distance, Location, Units};
use serde::{Deserialize, Serialize};

/// A geographical coordinate in decimal degrees.
///
/// Latitude is positive towards the north, longitude positive towards the
/// east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometers (haversine, Earth
    /// radius 6371 km).
    pub fn distance_km(&self, other: &Position) -> f64 {
        distance(
            Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            Units::Kilometers,
        )
    }
}
