//! Polylines and polygons.

use serde::{Deserialize, Serialize};

use super::{Location, Rectangle};

/// An ordered sequence of locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyLine(Vec<Location>);

impl PolyLine {
    pub fn new(locations: Vec<Location>) -> Self {
        Self(locations)
    }

    pub fn locations(&self) -> &[Location] {
        &self.0
    }

    pub fn first(&self) -> Option<Location> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Location> {
        self.0.last().copied()
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_locations(&self.0)
    }

    /// Consecutive location pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Location, Location)> + '_ {
        self.0.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Sum of great-circle segment lengths in metres.
    pub fn length_meters(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(&b)).sum()
    }
}

/// A simple polygon given by its outer ring.
///
/// The ring is implicitly closed: the last location connects back to the first
/// and must not repeat it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon(Vec<Location>);

impl Polygon {
    pub fn new(ring: Vec<Location>) -> Self {
        Self(ring)
    }

    pub fn locations(&self) -> &[Location] {
        &self.0
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        Rectangle::from_locations(&self.0)
    }

    /// Ring edges including the closing edge.
    pub fn segments(&self) -> impl Iterator<Item = (Location, Location)> + '_ {
        let n = self.0.len();
        let count = if n < 2 { 0 } else { n };
        (0..count).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }

    /// Whether the location is inside the ring or on its boundary.
    pub fn contains(&self, location: Location) -> bool {
        if self.0.is_empty() {
            return false;
        }
        let on_boundary = self.segments().any(|(a, b)| {
            let bounds = Rectangle::from_point(a).union(&Rectangle::from_point(b));
            bounds.contains(location) && {
                let cross = (b.longitude - a.longitude) * (location.latitude - a.latitude)
                    - (b.latitude - a.latitude) * (location.longitude - a.longitude);
                cross == 0.0
            }
        });
        if on_boundary {
            return true;
        }

        // Even-odd ray cast towards positive longitude
        let mut inside = false;
        for (a, b) in self.segments() {
            if (a.latitude > location.latitude) != (b.latitude > location.latitude) {
                let crossing = a.longitude
                    + (location.latitude - a.latitude) * (b.longitude - a.longitude)
                        / (b.latitude - a.latitude);
                if location.longitude < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Planar perimeter as a closed polyline.
    pub fn to_closed_polyline(&self) -> PolyLine {
        let mut ring = self.0.clone();
        if let Some(first) = self.0.first() {
            ring.push(*first);
        }
        PolyLine::new(ring)
    }
}
