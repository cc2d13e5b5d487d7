//! Axis-aligned latitude/longitude rectangles.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::segment::segments_intersect;
use super::{Location, PolyLine, Polygon};

/// Geographic bounding box.
///
/// All containment and intersection tests are boundary inclusive: a point on
/// the edge of a rectangle is inside it. Shards rely on this so that a feature
/// sitting exactly on a tile edge is attributed to both tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Minimum (southernmost) latitude
    pub min_lat: f64,
    /// Maximum (northernmost) latitude
    pub max_lat: f64,
    /// Minimum (westernmost) longitude
    pub min_lon: f64,
    /// Maximum (easternmost) longitude
    pub max_lon: f64,
}

impl Rectangle {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Create a degenerate bounding box around a single point.
    pub fn from_point(location: Location) -> Self {
        Self {
            min_lat: location.latitude,
            max_lat: location.latitude,
            min_lon: location.longitude,
            max_lon: location.longitude,
        }
    }

    /// Smallest rectangle containing every location, `None` when empty.
    pub fn from_locations<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Option<Self> {
        let mut iter = locations.into_iter();
        let mut bounds = Self::from_point(*iter.next()?);
        for location in iter {
            bounds.expand(*location);
        }
        Some(bounds)
    }

    /// Expand this bounding box to include a point.
    pub fn expand(&mut self, location: Location) {
        self.min_lat = self.min_lat.min(location.latitude);
        self.max_lat = self.max_lat.max(location.latitude);
        self.min_lon = self.min_lon.min(location.longitude);
        self.max_lon = self.max_lon.max(location.longitude);
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Corners in ring order: south-west, north-west, north-east, south-east.
    pub fn corners(&self) -> [Location; 4] {
        [
            Location::new(self.min_lat, self.min_lon),
            Location::new(self.max_lat, self.min_lon),
            Location::new(self.max_lat, self.max_lon),
            Location::new(self.min_lat, self.max_lon),
        ]
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> Location {
        Location::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Get the width of the bounds in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Get the height of the bounds in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Whether the location lies inside or on the boundary.
    pub fn contains(&self, location: Location) -> bool {
        (self.min_lat..=self.max_lat).contains(&location.latitude)
            && (self.min_lon..=self.max_lon).contains(&location.longitude)
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains_rectangle(&self, other: &Rectangle) -> bool {
        self.min_lat <= other.min_lat
            && other.max_lat <= self.max_lat
            && self.min_lon <= other.min_lon
            && other.max_lon <= self.max_lon
    }

    /// Whether the two rectangles share at least one point.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    /// Whether the segment `a`-`b` touches this rectangle.
    pub fn intersects_segment(&self, a: Location, b: Location) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let segment_bounds = Rectangle::from_point(a).union(&Rectangle::from_point(b));
        if !self.intersects(&segment_bounds) {
            return false;
        }
        let corners = self.corners();
        (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
    }

    /// Whether any part of the polyline touches this rectangle.
    pub fn intersects_polyline(&self, polyline: &PolyLine) -> bool {
        match polyline.locations() {
            [] => false,
            [single] => self.contains(*single),
            _ => polyline
                .segments()
                .any(|(a, b)| self.intersects_segment(a, b)),
        }
    }

    /// Whether the polygon's area or boundary touches this rectangle.
    pub fn intersects_polygon(&self, polygon: &Polygon) -> bool {
        match polygon.bounds() {
            Some(bounds) if self.intersects(&bounds) => {}
            _ => return false,
        }
        if polygon.locations().iter().any(|l| self.contains(*l)) {
            return true;
        }
        if self.corners().iter().any(|c| polygon.contains(*c)) {
            return true;
        }
        polygon
            .segments()
            .any(|(a, b)| self.intersects_segment(a, b))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.7},{:.7} .. {:.7},{:.7}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Rectangle {
        Rectangle::new(0.0, 1.0, 0.0, 1.0)
    }

    #[test]
    fn test_contains_is_boundary_inclusive() {
        let rect = unit();
        assert!(rect.contains(Location::new(0.0, 0.0)));
        assert!(rect.contains(Location::new(1.0, 0.5)));
        assert!(!rect.contains(Location::new(1.0001, 0.5)));
    }

    #[test]
    fn test_from_locations_and_expand() {
        let locations = [
            Location::new(53.5, 9.7),
            Location::new(54.0, 10.5),
            Location::new(53.8, 9.0),
        ];
        let bounds = Rectangle::from_locations(&locations).unwrap();
        assert_eq!(bounds, Rectangle::new(53.5, 54.0, 9.0, 10.5));
        assert!(Rectangle::from_locations(&[]).is_none());
    }

    #[test]
    fn test_center_width_height() {
        let bounds = Rectangle::new(53.0, 54.0, 9.0, 11.0);
        let center = bounds.center();
        assert!((center.latitude - 53.5).abs() < 1e-9);
        assert!((center.longitude - 10.0).abs() < 1e-9);
        assert!((bounds.width() - 2.0).abs() < 1e-9);
        assert!((bounds.height() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rectangles_touching_on_edge_intersect() {
        let left = unit();
        let right = Rectangle::new(0.0, 1.0, 1.0, 2.0);
        let far = Rectangle::new(0.0, 1.0, 1.5, 2.0);
        assert!(left.intersects(&right));
        assert!(!left.intersects(&far));
    }

    #[test]
    fn test_segment_crossing_without_endpoints_inside() {
        let rect = unit();
        let a = Location::new(0.5, -1.0);
        let b = Location::new(0.5, 2.0);
        assert!(rect.intersects_segment(a, b));
        assert!(!rect.intersects_segment(Location::new(2.0, -1.0), Location::new(2.0, 2.0)));
    }

    #[test]
    fn test_diagonal_segment_missing_corner() {
        let rect = unit();
        // Passes just outside the north-east corner
        let a = Location::new(1.5, 0.0);
        let b = Location::new(3.0, 1.5);
        assert!(!rect.intersects_segment(a, b));
    }

    #[test]
    fn test_polygon_enclosing_rectangle_intersects() {
        let rect = unit();
        let polygon = Polygon::new(vec![
            Location::new(-5.0, -5.0),
            Location::new(5.0, -5.0),
            Location::new(5.0, 5.0),
            Location::new(-5.0, 5.0),
        ]);
        assert!(rect.intersects_polygon(&polygon));
    }

    #[test]
    fn test_polygon_inside_rectangle_intersects() {
        let rect = unit();
        let polygon = Polygon::new(vec![
            Location::new(0.2, 0.2),
            Location::new(0.4, 0.2),
            Location::new(0.4, 0.4),
        ]);
        assert!(rect.intersects_polygon(&polygon));
    }

    #[test]
    fn test_polyline_intersection() {
        let rect = unit();
        let inside = PolyLine::new(vec![Location::new(0.1, 0.1), Location::new(0.2, 0.2)]);
        let outside = PolyLine::new(vec![Location::new(3.0, 3.0), Location::new(4.0, 4.0)]);
        assert!(rect.intersects_polyline(&inside));
        assert!(!rect.intersects_polyline(&outside));
    }
}
