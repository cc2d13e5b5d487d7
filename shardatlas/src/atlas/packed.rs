//! The in-memory, immutable atlas implementation.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    Area, Atlas, AtlasEntity, AtlasMetaData, Edge, ItemType, Line, Node, Point, Relation,
};
use crate::geometry::Rectangle;

/// Serializable contents of a [`PackedAtlas`].
///
/// This is the shape shard files are written in; derived indexes are rebuilt
/// on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasContents {
    pub name: String,
    #[serde(default)]
    pub metadata: AtlasMetaData,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub areas: Vec<Area>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Collects features and produces a [`PackedAtlas`].
///
/// The first feature added with a given identifier wins; later duplicates of
/// the same kind are ignored.
///
/// # Example
///
/// ```
/// use shardatlas::atlas::{Atlas, PackedAtlasBuilder, Point};
/// use shardatlas::geometry::Location;
///
/// let mut builder = PackedAtlasBuilder::new("example");
/// builder.add_point(Point::new(1, Location::new(48.85, 2.35)).with_tag("name", "Paris"));
/// let atlas = builder.build();
///
/// assert_eq!(atlas.number_of_points(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PackedAtlasBuilder {
    name: String,
    metadata: AtlasMetaData,
    nodes: BTreeMap<i64, Node>,
    edges: BTreeMap<i64, Edge>,
    areas: BTreeMap<i64, Area>,
    lines: BTreeMap<i64, Line>,
    points: BTreeMap<i64, Point>,
    relations: BTreeMap<i64, Relation>,
}

impl PackedAtlasBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: AtlasMetaData) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.entry(node.identifier).or_insert(node);
        self
    }

    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.entry(edge.identifier).or_insert(edge);
        self
    }

    pub fn add_area(&mut self, area: Area) -> &mut Self {
        self.areas.entry(area.identifier).or_insert(area);
        self
    }

    pub fn add_line(&mut self, line: Line) -> &mut Self {
        self.lines.entry(line.identifier).or_insert(line);
        self
    }

    pub fn add_point(&mut self, point: Point) -> &mut Self {
        self.points.entry(point.identifier).or_insert(point);
        self
    }

    pub fn add_relation(&mut self, relation: Relation) -> &mut Self {
        self.relations
            .entry(relation.identifier)
            .or_insert(relation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.areas.is_empty()
            && self.lines.is_empty()
            && self.points.is_empty()
            && self.relations.is_empty()
    }

    /// Freeze the collected features and compute the derived indexes.
    pub fn build(self) -> PackedAtlas {
        let mut edges_out: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut edges_in: HashMap<i64, Vec<i64>> = HashMap::new();
        for edge in self.edges.values() {
            edges_out
                .entry(edge.start_node)
                .or_default()
                .push(edge.identifier);
            edges_in
                .entry(edge.end_node)
                .or_default()
                .push(edge.identifier);
        }

        let mut parents: HashMap<(ItemType, i64), BTreeSet<i64>> = HashMap::new();
        for relation in self.relations.values() {
            for member in &relation.members {
                parents
                    .entry(member.key())
                    .or_default()
                    .insert(relation.identifier);
            }
        }

        let bounds = self
            .nodes
            .values()
            .filter_map(AtlasEntity::bounds)
            .chain(self.edges.values().filter_map(AtlasEntity::bounds))
            .chain(self.areas.values().filter_map(AtlasEntity::bounds))
            .chain(self.lines.values().filter_map(AtlasEntity::bounds))
            .chain(self.points.values().filter_map(AtlasEntity::bounds))
            .reduce(|acc, b| acc.union(&b));

        PackedAtlas {
            name: self.name,
            metadata: self.metadata,
            bounds,
            nodes: arc_values(self.nodes),
            edges: arc_values(self.edges),
            areas: arc_values(self.areas),
            lines: arc_values(self.lines),
            points: arc_values(self.points),
            relations: arc_values(self.relations),
            edges_out,
            edges_in,
            parents,
        }
    }
}

fn arc_values<T>(map: BTreeMap<i64, T>) -> BTreeMap<i64, Arc<T>> {
    map.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
}

/// An immutable atlas held entirely in memory.
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    name: String,
    metadata: AtlasMetaData,
    bounds: Option<Rectangle>,
    nodes: BTreeMap<i64, Arc<Node>>,
    edges: BTreeMap<i64, Arc<Edge>>,
    areas: BTreeMap<i64, Arc<Area>>,
    lines: BTreeMap<i64, Arc<Line>>,
    points: BTreeMap<i64, Arc<Point>>,
    relations: BTreeMap<i64, Arc<Relation>>,
    /// Node identifier → edges starting there.
    edges_out: HashMap<i64, Vec<i64>>,
    /// Node identifier → edges ending there.
    edges_in: HashMap<i64, Vec<i64>>,
    /// Member key → relations listing it.
    parents: HashMap<(ItemType, i64), BTreeSet<i64>>,
}

impl PackedAtlas {
    /// Rebuild an atlas from its serializable contents.
    pub fn from_contents(contents: AtlasContents) -> Self {
        let mut builder = PackedAtlasBuilder::new(contents.name).with_metadata(contents.metadata);
        for node in contents.nodes {
            builder.add_node(node);
        }
        for edge in contents.edges {
            builder.add_edge(edge);
        }
        for area in contents.areas {
            builder.add_area(area);
        }
        for line in contents.lines {
            builder.add_line(line);
        }
        for point in contents.points {
            builder.add_point(point);
        }
        for relation in contents.relations {
            builder.add_relation(relation);
        }
        builder.build()
    }

    /// Copy the features out into serializable form.
    pub fn to_contents(&self) -> AtlasContents {
        AtlasContents {
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            nodes: self.nodes.values().map(|n| (**n).clone()).collect(),
            edges: self.edges.values().map(|e| (**e).clone()).collect(),
            areas: self.areas.values().map(|a| (**a).clone()).collect(),
            lines: self.lines.values().map(|l| (**l).clone()).collect(),
            points: self.points.values().map(|p| (**p).clone()).collect(),
            relations: self.relations.values().map(|r| (**r).clone()).collect(),
        }
    }

    fn member_intersects(
        &self,
        item_type: ItemType,
        identifier: i64,
        bounds: &Rectangle,
        path: &mut HashSet<i64>,
    ) -> bool {
        match item_type {
            ItemType::Node => self
                .nodes
                .get(&identifier)
                .is_some_and(|n| bounds.contains(n.location)),
            ItemType::Point => self
                .points
                .get(&identifier)
                .is_some_and(|p| bounds.contains(p.location)),
            ItemType::Edge => self
                .edges
                .get(&identifier)
                .is_some_and(|e| bounds.intersects_polyline(&e.polyline)),
            ItemType::Line => self
                .lines
                .get(&identifier)
                .is_some_and(|l| bounds.intersects_polyline(&l.polyline)),
            ItemType::Area => self
                .areas
                .get(&identifier)
                .is_some_and(|a| bounds.intersects_polygon(&a.polygon)),
            ItemType::Relation => {
                // Already on the current path: a cycle contributes nothing
                if !path.insert(identifier) {
                    return false;
                }
                let hit = self.relations.get(&identifier).is_some_and(|relation| {
                    relation
                        .members
                        .iter()
                        .any(|m| self.member_intersects(m.item_type, m.identifier, bounds, path))
                });
                path.remove(&identifier);
                hit
            }
        }
    }

    fn member_bounds(
        &self,
        item_type: ItemType,
        identifier: i64,
        path: &mut HashSet<i64>,
    ) -> Option<Rectangle> {
        match item_type {
            ItemType::Node => self.nodes.get(&identifier).and_then(|n| n.bounds()),
            ItemType::Point => self.points.get(&identifier).and_then(|p| p.bounds()),
            ItemType::Edge => self.edges.get(&identifier).and_then(|e| e.bounds()),
            ItemType::Line => self.lines.get(&identifier).and_then(|l| l.bounds()),
            ItemType::Area => self.areas.get(&identifier).and_then(|a| a.bounds()),
            ItemType::Relation => {
                if !path.insert(identifier) {
                    return None;
                }
                let bounds = self.relations.get(&identifier).and_then(|relation| {
                    relation
                        .members
                        .iter()
                        .filter_map(|m| self.member_bounds(m.item_type, m.identifier, path))
                        .reduce(|acc, b| acc.union(&b))
                });
                path.remove(&identifier);
                bounds
            }
        }
    }

    fn edges_by_ids(&self, ids: Option<&Vec<i64>>) -> Vec<Arc<Edge>> {
        let mut edges: Vec<Arc<Edge>> = ids
            .into_iter()
            .flatten()
            .filter_map(|id| self.edges.get(id).cloned())
            .collect();
        edges.sort_by_key(|e| e.identifier);
        edges
    }
}

impl Atlas for PackedAtlas {
    fn name(&self) -> &str {
        &self.name
    }

    fn metadata(&self) -> &AtlasMetaData {
        &self.metadata
    }

    fn bounds(&self) -> Option<Rectangle> {
        self.bounds
    }

    fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    fn number_of_areas(&self) -> usize {
        self.areas.len()
    }

    fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    fn number_of_points(&self) -> usize {
        self.points.len()
    }

    fn number_of_relations(&self) -> usize {
        self.relations.len()
    }

    fn node(&self, identifier: i64) -> Option<Arc<Node>> {
        self.nodes.get(&identifier).cloned()
    }

    fn edge(&self, identifier: i64) -> Option<Arc<Edge>> {
        self.edges.get(&identifier).cloned()
    }

    fn area(&self, identifier: i64) -> Option<Arc<Area>> {
        self.areas.get(&identifier).cloned()
    }

    fn line(&self, identifier: i64) -> Option<Arc<Line>> {
        self.lines.get(&identifier).cloned()
    }

    fn point(&self, identifier: i64) -> Option<Arc<Point>> {
        self.points.get(&identifier).cloned()
    }

    fn relation(&self, identifier: i64) -> Option<Arc<Relation>> {
        self.relations.get(&identifier).cloned()
    }

    fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.values().cloned().collect()
    }

    fn edges(&self) -> Vec<Arc<Edge>> {
        self.edges.values().cloned().collect()
    }

    fn areas(&self) -> Vec<Arc<Area>> {
        self.areas.values().cloned().collect()
    }

    fn lines(&self) -> Vec<Arc<Line>> {
        self.lines.values().cloned().collect()
    }

    fn points(&self) -> Vec<Arc<Point>> {
        self.points.values().cloned().collect()
    }

    fn relations(&self) -> Vec<Arc<Relation>> {
        self.relations.values().cloned().collect()
    }

    fn nodes_within(&self, bounds: &Rectangle) -> Vec<Arc<Node>> {
        self.nodes
            .values()
            .filter(|n| bounds.contains(n.location))
            .cloned()
            .collect()
    }

    fn points_within(&self, bounds: &Rectangle) -> Vec<Arc<Point>> {
        self.points
            .values()
            .filter(|p| bounds.contains(p.location))
            .cloned()
            .collect()
    }

    fn edges_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Edge>> {
        self.edges
            .values()
            .filter(|e| bounds.intersects_polyline(&e.polyline))
            .cloned()
            .collect()
    }

    fn lines_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Line>> {
        self.lines
            .values()
            .filter(|l| bounds.intersects_polyline(&l.polyline))
            .cloned()
            .collect()
    }

    fn areas_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Area>> {
        self.areas
            .values()
            .filter(|a| bounds.intersects_polygon(&a.polygon))
            .cloned()
            .collect()
    }

    fn relations_intersecting(&self, bounds: &Rectangle) -> Vec<Arc<Relation>> {
        self.relations
            .values()
            .filter(|relation| {
                let mut path = HashSet::from([relation.identifier]);
                relation.members.iter().any(|m| {
                    self.member_intersects(m.item_type, m.identifier, bounds, &mut path)
                })
            })
            .cloned()
            .collect()
    }

    fn relations_with_member(&self, item_type: ItemType, identifier: i64) -> Vec<Arc<Relation>> {
        self.parents
            .get(&(item_type, identifier))
            .into_iter()
            .flatten()
            .filter_map(|id| self.relations.get(id).cloned())
            .collect()
    }

    fn edges_starting_at(&self, node: i64) -> Vec<Arc<Edge>> {
        self.edges_by_ids(self.edges_out.get(&node))
    }

    fn edges_ending_at(&self, node: i64) -> Vec<Arc<Edge>> {
        self.edges_by_ids(self.edges_in.get(&node))
    }

    fn relation_bounds(&self, identifier: i64) -> Option<Rectangle> {
        let mut path = HashSet::new();
        self.member_bounds(ItemType::Relation, identifier, &mut path)
    }
}
