//! The read-only query surface shared by every atlas.

use std::fmt;
use std::sync::Arc;

use super::{Area, AtlasMetaData, Edge, ItemType, Line, Node, Point, Relation};
use crate::geometry::Rectangle;

/// An immutable, queryable collection of map features.
///
/// All enumerations return features ordered by identifier. Features are
/// handed out as `Arc`s so a caller can hold on to one while the atlas that
/// produced it is replaced.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so snapshots can be shared through
/// `Arc<dyn Atlas>`.
pub trait Atlas: Send + Sync + fmt::Debug {
    /// Human-readable atlas name.
    fn name(&self) -> &str;

    fn metadata(&self) -> &AtlasMetaData;

    /// Bounds of every feature with geometry, `None` for an empty atlas.
    fn bounds(&self) -> Option<Rectangle>;

    fn number_of_nodes(&self) -> usize;
    fn number_of_edges(&self) -> usize;
    fn number_of_areas(&self) -> usize;
    fn number_of_lines(&self) -> usize;
    fn number_of_points(&self) -> usize;
    fn number_of_relations(&self) -> usize;

    fn node(&self, identifier: i64) -> Option<Arc<Node>>;
    fn edge(&self, identifier: i64) -> Option<Arc<Edge>>;
    fn area(&self, identifier: i64) -> Option<Arc<Area>>;
    fn line(&self, identifier: i64) -> Option<Arc<Line>>;
    fn point(&self, identifier: i64) -> Option<Arc<Point>>;
    fn relation(&self, identifier: i64) -> Option<Arc<Relation>>;

    fn nodes(&self) -> Vec<Arc<Node>>;
    fn edges(&self) -> Vec<Arc<Edge>>;
    fn areas(&self) -> Vec<Arc<Area>>;
    fn lines(&self) -> Vec<Arc<Line>>;
    fn points(&self) -> Vec<Arc<Point>>;
    fn relations(&self) -> Vec<Arc<Relation>>;

    fn nodes_within(&self, bounds: &Rectangle) -> Vec<Arc<Node>>;
    fn points_within(&self, bounds: &Rectangle) -> Vec<Arc<Point>>;
    fn edges_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Edge>>;
    fn lines_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Line>>;
    fn areas_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Area>>;

    /// Relations with at least one member (directly or through nested
    /// relations) intersecting the bounds.
    fn relations_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Relation>>;

    /// Relations listing the given feature as a member.
    fn relations_with_member(&self, item_type: ItemType, identifier: i64) -> Vec<Arc<Relation>>;

    /// Edges whose start node is `node`.
    fn edges_starting_at(&self, node: i64) -> Vec<Arc<Edge>>;

    /// Edges whose end node is `node`.
    fn edges_ending_at(&self, node: i64) -> Vec<Arc<Edge>>;

    /// Bounds of the members of a relation this atlas can resolve.
    fn relation_bounds(&self, identifier: i64) -> Option<Rectangle>;

    /// Total number of features of every kind.
    fn number_of_entities(&self) -> usize {
        self.number_of_nodes()
            + self.number_of_edges()
            + self.number_of_areas()
            + self.number_of_lines()
            + self.number_of_points()
            + self.number_of_relations()
    }

    /// Whether a feature of this kind and identifier is present.
    fn contains_entity(&self, item_type: ItemType, identifier: i64) -> bool {
        match item_type {
            ItemType::Node => self.node(identifier).is_some(),
            ItemType::Edge => self.edge(identifier).is_some(),
            ItemType::Area => self.area(identifier).is_some(),
            ItemType::Line => self.line(identifier).is_some(),
            ItemType::Point => self.point(identifier).is_some(),
            ItemType::Relation => self.relation(identifier).is_some(),
        }
    }
}
