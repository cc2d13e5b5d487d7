//! Geographic point type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres (haversine distances).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Location {
    /// Create a location from latitude and longitude in degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another location in metres.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1_rad = self.latitude * DEG_TO_RAD;
        let lat2_rad = other.latitude * DEG_TO_RAD;
        let delta_lat = (other.latitude - self.latitude) * DEG_TO_RAD;
        let delta_lon = (other.longitude - self.longitude) * DEG_TO_RAD;

        // Haversine formula
        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_METERS * c
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_one_degree_latitude() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(1.0, 0.0);
        let distance = a.distance_to(&b);
        // One degree of latitude is ~111.2 km
        assert!((distance - 111_195.0).abs() < 100.0, "got {}", distance);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Location::new(53.55, 9.99);
        let b = Location::new(51.51, -0.13);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_display() {
        let location = Location::new(1.5, -2.25);
        assert_eq!(location.to_string(), "(1.5000000, -2.2500000)");
    }
}
