//! Union of rectangles.

use serde::{Deserialize, Serialize};

use super::{Location, PolyLine, Polygon, Rectangle};

/// A region made of possibly touching rectangles, such as the union of a set
/// of shard bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiRectangle {
    parts: Vec<Rectangle>,
}

impl MultiRectangle {
    pub fn new(parts: Vec<Rectangle>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Rectangle] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Bounding box of all parts.
    pub fn bounds(&self) -> Option<Rectangle> {
        let mut parts = self.parts.iter();
        let first = *parts.next()?;
        Some(parts.fold(first, |acc, part| acc.union(part)))
    }

    pub fn overlaps_rectangle(&self, rectangle: &Rectangle) -> bool {
        self.parts.iter().any(|part| part.intersects(rectangle))
    }

    pub fn overlaps_polygon(&self, polygon: &Polygon) -> bool {
        self.parts.iter().any(|part| part.intersects_polygon(polygon))
    }

    pub fn overlaps_polyline(&self, polyline: &PolyLine) -> bool {
        self.parts
            .iter()
            .any(|part| part.intersects_polyline(polyline))
    }

    pub fn overlaps_location(&self, location: Location) -> bool {
        self.parts.iter().any(|part| part.contains(location))
    }

    /// Whether the location lies inside the union, boundary included.
    ///
    /// For a point, full enclosure reduces to membership in one of the parts;
    /// it is kept distinct from [`Self::overlaps_location`] to mirror the
    /// enclosure test used for areas and lines.
    pub fn fully_encloses(&self, location: Location) -> bool {
        self.parts.iter().any(|part| part.contains(location))
    }
}

impl FromIterator<Rectangle> for MultiRectangle {
    fn from_iter<T: IntoIterator<Item = Rectangle>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tiles() -> MultiRectangle {
        MultiRectangle::new(vec![
            Rectangle::new(0.0, 1.0, 0.0, 1.0),
            Rectangle::new(0.0, 1.0, 1.0, 2.0),
        ])
    }

    #[test]
    fn test_bounds_of_parts() {
        assert_eq!(
            two_tiles().bounds(),
            Some(Rectangle::new(0.0, 1.0, 0.0, 2.0))
        );
        assert_eq!(MultiRectangle::default().bounds(), None);
    }

    #[test]
    fn test_location_membership() {
        let union = two_tiles();
        assert!(union.fully_encloses(Location::new(0.5, 1.5)));
        assert!(union.fully_encloses(Location::new(0.5, 1.0)));
        assert!(!union.fully_encloses(Location::new(0.5, 2.5)));
    }

    #[test]
    fn test_polyline_overlap() {
        let union = two_tiles();
        let crossing = PolyLine::new(vec![Location::new(0.5, 1.5), Location::new(0.5, 5.0)]);
        let away = PolyLine::new(vec![Location::new(5.0, 5.0), Location::new(6.0, 6.0)]);
        assert!(union.overlaps_polyline(&crossing));
        assert!(!union.overlaps_polyline(&away));
    }

    #[test]
    fn test_collect_from_rectangles() {
        let union: MultiRectangle = vec![Rectangle::new(0.0, 1.0, 0.0, 1.0)]
            .into_iter()
            .collect();
        assert_eq!(union.parts().len(), 1);
    }
}
