//! Slippy-map tile sharding.

use std::collections::BTreeSet;

use super::{Shard, Sharding};
use crate::coord::{to_tile_coords, tiles_per_axis, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::geometry::{Location, PolyLine, Polygon, Rectangle};

/// Shards the world into Web Mercator tiles at a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippyTileSharding {
    zoom: u8,
}

impl SlippyTileSharding {
    /// Create a sharding at the given zoom level.
    pub fn new(zoom: u8) -> Self {
        Self { zoom }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// The shard containing a location, picking the south-east tile on edges.
    pub fn shard_at(&self, location: Location) -> Option<Shard> {
        to_tile_coords(location.latitude, location.longitude, self.zoom)
            .ok()
            .map(Shard::from)
    }

    /// Candidate tiles around `bounds`, padded by one tile on each side so
    /// that tiles merely touching the bounds are considered.
    fn candidates(&self, bounds: &Rectangle) -> Vec<Shard> {
        let clamp_lat = |lat: f64| lat.clamp(MIN_LAT, MAX_LAT);
        let clamp_lon = |lon: f64| lon.clamp(MIN_LON, MAX_LON);

        // North-west corner gives the smallest row and column
        let (Ok(north_west), Ok(south_east)) = (
            to_tile_coords(clamp_lat(bounds.max_lat), clamp_lon(bounds.min_lon), self.zoom),
            to_tile_coords(clamp_lat(bounds.min_lat), clamp_lon(bounds.max_lon), self.zoom),
        ) else {
            return Vec::new();
        };

        let last = tiles_per_axis(self.zoom) - 1;
        let row_range = north_west.row.saturating_sub(1)..=(south_east.row + 1).min(last);
        let col_range = north_west.col.saturating_sub(1)..=(south_east.col + 1).min(last);

        let mut shards = Vec::new();
        for y in row_range {
            for x in col_range.clone() {
                shards.push(Shard {
                    zoom: self.zoom,
                    x,
                    y,
                });
            }
        }
        shards
    }
}

impl Sharding for SlippyTileSharding {
    fn shards_for(&self, polygon: &Polygon) -> BTreeSet<Shard> {
        let Some(bounds) = polygon.bounds() else {
            return BTreeSet::new();
        };
        self.candidates(&bounds)
            .into_iter()
            .filter(|shard| shard.bounds().intersects_polygon(polygon))
            .collect()
    }

    fn shards_intersecting(&self, polyline: &PolyLine) -> BTreeSet<Shard> {
        let Some(bounds) = polyline.bounds() else {
            return BTreeSet::new();
        };
        self.candidates(&bounds)
            .into_iter()
            .filter(|shard| shard.bounds().intersects_polyline(polyline))
            .collect()
    }

    fn shards_covering(&self, location: Location) -> BTreeSet<Shard> {
        self.candidates(&Rectangle::from_point(location))
            .into_iter()
            .filter(|shard| shard.bounds().contains(location))
            .collect()
    }

    fn neighbors(&self, shard: &Shard) -> BTreeSet<Shard> {
        shard.neighbors().into_iter().collect()
    }

    fn shards_for_bounds(&self, bounds: &Rectangle) -> BTreeSet<Shard> {
        self.candidates(bounds)
            .into_iter()
            .filter(|shard| shard.bounds().intersects(bounds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZOOM: u8 = 10;

    fn sharding() -> SlippyTileSharding {
        SlippyTileSharding::new(ZOOM)
    }

    #[test]
    fn test_location_inside_one_tile() {
        let shard = Shard::new(ZOOM, 530, 340).unwrap();
        let center = shard.bounds().center();
        let covering = sharding().shards_covering(center);
        assert_eq!(covering.into_iter().collect::<Vec<_>>(), vec![shard]);
        assert_eq!(sharding().shard_at(center), Some(shard));
    }

    #[test]
    fn test_location_on_tile_edge_belongs_to_both() {
        let west = Shard::new(ZOOM, 530, 340).unwrap();
        let east = Shard::new(ZOOM, 531, 340).unwrap();
        let bounds = west.bounds();
        let on_edge = Location::new(bounds.center().latitude, bounds.max_lon);

        let covering = sharding().shards_covering(on_edge);
        assert!(covering.contains(&west));
        assert!(covering.contains(&east));
    }

    #[test]
    fn test_line_across_two_tiles() {
        let west = Shard::new(ZOOM, 530, 340).unwrap();
        let east = Shard::new(ZOOM, 531, 340).unwrap();
        let line = PolyLine::new(vec![west.bounds().center(), east.bounds().center()]);

        let shards = sharding().shards_intersecting(&line);
        assert_eq!(shards.into_iter().collect::<Vec<_>>(), vec![west, east]);
    }

    #[test]
    fn test_polygon_spanning_four_tiles() {
        let origin = Shard::new(ZOOM, 530, 340).unwrap();
        let diagonal = Shard::new(ZOOM, 531, 341).unwrap();
        let a = origin.bounds().center();
        let c = diagonal.bounds().center();
        let polygon = Polygon::new(vec![
            a,
            Location::new(a.latitude, c.longitude),
            c,
            Location::new(c.latitude, a.longitude),
        ]);

        assert_eq!(sharding().shards_for(&polygon).len(), 4);
    }

    #[test]
    fn test_bounds_to_shards() {
        let shard = Shard::new(ZOOM, 530, 340).unwrap();
        let bounds = shard.bounds();
        let inner = Rectangle::new(
            bounds.min_lat + bounds.height() / 4.0,
            bounds.max_lat - bounds.height() / 4.0,
            bounds.min_lon + bounds.width() / 4.0,
            bounds.max_lon - bounds.width() / 4.0,
        );
        let shards = sharding().shards_for_bounds(&inner);
        assert_eq!(shards.into_iter().collect::<Vec<_>>(), vec![shard]);
    }

    #[test]
    fn test_empty_geometry_has_no_shards() {
        assert!(sharding().shards_intersecting(&PolyLine::new(vec![])).is_empty());
        assert!(sharding().shards_for(&Polygon::new(vec![])).is_empty());
    }
}
