//! On-demand slicing of one raw atlas into shards.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::AtlasFetcher;
use crate::atlas::{Atlas, AtlasMetaData, ItemType, PackedAtlas, PackedAtlasBuilder, Relation};
use crate::sharding::Shard;

/// Cut the part of `raw` belonging to `shard`.
///
/// A shard holds:
/// - areas, lines and edges whose geometry touches the shard bounds, unclipped
/// - points and nodes inside the bounds
/// - the start and end nodes of every included edge
/// - relations with at least one included member, nested relations included,
///   listing only their included members
///
/// Returns `None` when nothing falls in the shard.
pub fn slice_shard(raw: &PackedAtlas, shard: &Shard) -> Option<PackedAtlas> {
    let bounds = shard.bounds();
    let metadata = AtlasMetaData {
        shard: Some(shard.name()),
        data_version: raw.metadata().data_version.clone(),
        ..AtlasMetaData::default()
    };
    let mut builder =
        PackedAtlasBuilder::new(format!("{}-{}", raw.name(), shard)).with_metadata(metadata);
    let mut included: HashSet<(ItemType, i64)> = HashSet::new();

    for area in raw.areas_intersecting(&bounds) {
        included.insert((ItemType::Area, area.identifier));
        builder.add_area((*area).clone());
    }
    for line in raw.lines_intersecting(&bounds) {
        included.insert((ItemType::Line, line.identifier));
        builder.add_line((*line).clone());
    }
    for point in raw.points_within(&bounds) {
        included.insert((ItemType::Point, point.identifier));
        builder.add_point((*point).clone());
    }
    for node in raw.nodes_within(&bounds) {
        included.insert((ItemType::Node, node.identifier));
        builder.add_node((*node).clone());
    }
    for edge in raw.edges_intersecting(&bounds) {
        included.insert((ItemType::Edge, edge.identifier));
        for end in [edge.start_node, edge.end_node] {
            if let Some(node) = raw.node(end) {
                included.insert((ItemType::Node, end));
                builder.add_node((*node).clone());
            }
        }
        builder.add_edge((*edge).clone());
    }

    // Relations join once any member is in; repeat for relations of relations
    let relations = raw.relations();
    let mut joined: BTreeSet<i64> = BTreeSet::new();
    loop {
        let before = joined.len();
        for relation in &relations {
            if joined.contains(&relation.identifier) {
                continue;
            }
            if relation.members.iter().any(|m| included.contains(&m.key())) {
                joined.insert(relation.identifier);
                included.insert((ItemType::Relation, relation.identifier));
            }
        }
        if joined.len() == before {
            break;
        }
    }

    for relation in relations.iter().filter(|r| joined.contains(&r.identifier)) {
        builder.add_relation(Relation {
            identifier: relation.identifier,
            members: relation
                .members
                .iter()
                .filter(|m| included.contains(&m.key()))
                .cloned()
                .collect(),
            tags: relation.tags.clone(),
        });
    }

    if builder.is_empty() {
        None
    } else {
        Some(builder.build())
    }
}

/// Fetcher slicing shards out of a raw, unsharded atlas.
///
/// Keeps a log of every fetch so callers can see exactly which shards were
/// loaded and how often.
#[derive(Debug)]
pub struct SlicedAtlasFetcher {
    raw: Arc<PackedAtlas>,
    fetch_count: AtomicUsize,
    fetched: Mutex<Vec<Shard>>,
}

impl SlicedAtlasFetcher {
    pub fn new(raw: Arc<PackedAtlas>) -> Self {
        Self {
            raw,
            fetch_count: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// The unsharded source atlas.
    pub fn raw(&self) -> &Arc<PackedAtlas> {
        &self.raw
    }

    /// Number of `fetch` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }

    /// Every shard fetched, in call order.
    pub fn fetched_shards(&self) -> Vec<Shard> {
        self.fetched.lock().clone()
    }
}

impl AtlasFetcher for SlicedAtlasFetcher {
    fn fetch(&self, shard: &Shard) -> Option<Arc<dyn Atlas>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.fetched.lock().push(*shard);

        let slice = slice_shard(&self.raw, shard);
        debug!(
            shard = %shard,
            entities = slice.as_ref().map_or(0, |s| s.number_of_entities()),
            "Sliced shard"
        );
        slice.map(|s| Arc::new(s) as Arc<dyn Atlas>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{Area, Edge, Line, Node, RelationMember};
    use crate::geometry::{Location, PolyLine, Polygon};

    // Zoom 2 tiles are 90 degrees wide: tile x=2 spans lon 0..90, x=1 spans -90..0
    fn raw() -> PackedAtlas {
        let mut builder = PackedAtlasBuilder::new("raw");
        builder
            .add_line(Line::new(
                1,
                PolyLine::new(vec![Location::new(10.0, -10.0), Location::new(10.0, 10.0)]),
            ))
            .add_area(Area::new(
                2,
                Polygon::new(vec![
                    Location::new(20.0, 20.0),
                    Location::new(30.0, 20.0),
                    Location::new(30.0, 30.0),
                ]),
            ))
            .add_node(Node::new(3, Location::new(5.0, -5.0)))
            .add_node(Node::new(4, Location::new(5.0, 5.0)))
            .add_edge(Edge::new(
                5,
                PolyLine::new(vec![Location::new(5.0, -5.0), Location::new(5.0, 5.0)]),
                3,
                4,
            ))
            .add_relation(Relation::new(
                6,
                vec![
                    RelationMember::new(ItemType::Line, 1, "a"),
                    RelationMember::new(ItemType::Area, 2, "b"),
                ],
            ))
            .add_relation(Relation::new(
                7,
                vec![RelationMember::new(ItemType::Relation, 6, "sub")],
            ));
        builder.build()
    }

    fn east() -> Shard {
        Shard::new(2, 2, 1).unwrap()
    }

    fn west() -> Shard {
        Shard::new(2, 1, 1).unwrap()
    }

    #[test]
    fn test_crossing_features_are_in_both_shards() {
        let raw = raw();
        let east = slice_shard(&raw, &east()).unwrap();
        let west = slice_shard(&raw, &west()).unwrap();

        assert!(east.line(1).is_some());
        assert!(west.line(1).is_some());
        assert!(east.area(2).is_some());
        assert!(west.area(2).is_none());
    }

    #[test]
    fn test_edge_endpoints_come_along() {
        let west = slice_shard(&raw(), &west()).unwrap();
        assert!(west.edge(5).is_some());
        assert!(west.node(3).is_some());
        assert!(west.node(4).is_some(), "end node lies east but is included");
    }

    #[test]
    fn test_relations_list_only_included_members() {
        let west = slice_shard(&raw(), &west()).unwrap();
        let relation = west.relation(6).unwrap();
        assert_eq!(relation.members.len(), 1);
        assert_eq!(relation.members[0].identifier, 1);

        // The parent of a sliced relation joins too
        assert!(west.relation(7).is_some());
    }

    #[test]
    fn test_empty_shard_is_none() {
        assert!(slice_shard(&raw(), &Shard::new(2, 0, 3).unwrap()).is_none());
    }

    #[test]
    fn test_fetcher_counts_calls() {
        let fetcher = SlicedAtlasFetcher::new(Arc::new(raw()));
        assert!(fetcher.fetch(&east()).is_some());
        assert!(fetcher.fetch(&Shard::new(2, 0, 3).unwrap()).is_none());
        assert_eq!(fetcher.fetch_count(), 2);
        assert_eq!(fetcher.fetched_shards()[0], east());
    }
}
