//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates. Shards are slippy-map tiles, so every
//! shard boundary in the crate is derived from the math in this module.

mod types;

pub use types::{
    tiles_per_axis, CoordError, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 18)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
/// Coordinates on the eastern or southern edge of the world map land in the
/// last column or row.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let last = tiles_per_axis(zoom) - 1;

    let col = (((lon + 180.0) / 360.0 * n) as u32).min(last);

    let lat_rad = lat * PI / 180.0;
    let row = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).max(0.0) as u32).min(last);

    Ok(TileCoord { row, col, zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Returns the (south, north, west, east) edges of a tile in degrees.
#[inline]
pub fn tile_edges(tile: &TileCoord) -> (f64, f64, f64, f64) {
    let (north, west) = tile_to_lat_lon(tile);
    let (south, east) = tile_to_lat_lon(&TileCoord {
        row: tile.row + 1,
        col: tile.col + 1,
        zoom: tile.zoom,
    });
    (south, north, west, east)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile_coords(40.7128, -74.0060, 16).unwrap();
        assert_eq!(tile.row, 24640);
        assert_eq!(tile.col, 19295);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = to_tile_coords(0.0, 180.5, 10);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(0.0, 0.0, 19);
        assert!(matches!(result, Err(CoordError::InvalidZoom(19))));
    }

    #[test]
    fn test_antimeridian_maps_to_last_column() {
        let tile = to_tile_coords(0.0, 180.0, 4).unwrap();
        assert_eq!(tile.col, 15);
    }

    #[test]
    fn test_tile_to_lat_lon_at_equator() {
        let tile = TileCoord::new(512, 512, 10);
        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!(lat.abs() < 1e-9, "Should be on the equator, got {}", lat);
        assert!(lon.abs() < 1e-9, "Should be on the prime meridian, got {}", lon);
    }

    #[test]
    fn test_tile_edges_ordering() {
        let tile = to_tile_coords(51.5074, -0.1278, 12).unwrap();
        let (south, north, west, east) = tile_edges(&tile);

        assert!(south < north);
        assert!(west < east);
        assert!((south..=north).contains(&51.5074));
        assert!((west..=east).contains(&-0.1278));
    }

    #[test]
    fn test_display_error_mentions_range() {
        let err = CoordError::InvalidZoom(30);
        assert!(err.to_string().contains("between 0 and 18"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_tile_contains_source_location(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let (south, north, west, east) = tile_edges(&tile);

                // Tolerance covers float error at the tile edges
                let eps = 1e-9;
                prop_assert!(south - eps <= lat && lat <= north + eps);
                prop_assert!(west - eps <= lon && lon <= east + eps);
            }

            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..=180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let max_tile = tiles_per_axis(zoom);
                prop_assert!(tile.row < max_tile);
                prop_assert!(tile.col < max_tile);
                prop_assert_eq!(tile.zoom, zoom);
            }
        }
    }
}
