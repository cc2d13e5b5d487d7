//! Merging several atlases into one.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::{Atlas, AtlasMetaData, ItemType, PackedAtlas, PackedAtlasBuilder, Relation};

/// Metadata tag of a merged atlas naming its sources.
pub const SOURCES_TAG: &str = "sources";

/// Merge atlases into a single [`PackedAtlas`].
///
/// Non-relation features are deduplicated by identifier, the first copy
/// encountered winning. Relations are not clipped at shard boundaries, so
/// each input may hold a different subset of a relation's members: the merged
/// relation lists the union of members in first-seen order and keeps the tags
/// of its first copy.
///
/// The merged metadata lists the source atlases under the
/// [`SOURCES_TAG`] tag, comma separated, in input order.
pub fn multi_atlas(atlases: &[Arc<dyn Atlas>]) -> PackedAtlas {
    let names: Vec<&str> = atlases.iter().map(|a| a.name()).collect();

    let metadata = AtlasMetaData {
        original: false,
        data_version: atlases
            .first()
            .map(|a| a.metadata().data_version.clone())
            .unwrap_or_else(|| AtlasMetaData::default().data_version),
        ..AtlasMetaData::default()
    }
    .with_tag(SOURCES_TAG, names.join(","));

    let name = names.join("+");

    let mut builder = PackedAtlasBuilder::new(name).with_metadata(metadata);
    let mut relations: BTreeMap<i64, (Relation, HashSet<(ItemType, i64)>)> =
        BTreeMap::new();

    for atlas in atlases {
        for node in atlas.nodes() {
            builder.add_node((*node).clone());
        }
        for edge in atlas.edges() {
            builder.add_edge((*edge).clone());
        }
        for area in atlas.areas() {
            builder.add_area((*area).clone());
        }
        for line in atlas.lines() {
            builder.add_line((*line).clone());
        }
        for point in atlas.points() {
            builder.add_point((*point).clone());
        }
        for relation in atlas.relations() {
            let (merged, seen) = relations.entry(relation.identifier).or_insert_with(|| {
                (
                    Relation {
                        identifier: relation.identifier,
                        members: Vec::new(),
                        tags: relation.tags.clone(),
                    },
                    HashSet::new(),
                )
            });
            for member in &relation.members {
                if seen.insert(member.key()) {
                    merged.members.push(member.clone());
                }
            }
        }
    }

    for (relation, _) in relations.into_values() {
        builder.add_relation(relation);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasEntity, Line, Point, RelationMember};
    use crate::geometry::{Location, PolyLine};

    fn shard_with(name: &str, point_tag: &str, line: i64, members: &[i64]) -> Arc<dyn Atlas> {
        let mut builder = PackedAtlasBuilder::new(name);
        builder
            .add_point(Point::new(1, Location::new(0.0, 0.0)).with_tag("from", point_tag))
            .add_line(Line::new(
                line,
                PolyLine::new(vec![Location::new(0.0, 0.0), Location::new(1.0, 1.0)]),
            ))
            .add_relation(
                Relation::new(
                    100,
                    members
                        .iter()
                        .map(|id| RelationMember::new(ItemType::Line, *id, "part"))
                        .collect(),
                )
                .with_tag("from", point_tag),
            );
        Arc::new(builder.build())
    }

    #[test]
    fn test_first_copy_of_feature_wins() {
        let merged = multi_atlas(&[
            shard_with("a", "a", 10, &[10]),
            shard_with("b", "b", 11, &[11]),
        ]);
        assert_eq!(merged.number_of_points(), 1);
        assert_eq!(merged.point(1).unwrap().tag("from"), Some("a"));
        assert_eq!(merged.number_of_lines(), 2);
    }

    #[test]
    fn test_relation_members_are_unioned() {
        let merged = multi_atlas(&[
            shard_with("a", "a", 10, &[10, 12]),
            shard_with("b", "b", 11, &[11, 12]),
        ]);
        let relation = merged.relation(100).unwrap();
        let ids: Vec<i64> = relation.members.iter().map(|m| m.identifier).collect();
        assert_eq!(ids, vec![10, 12, 11]);
        assert_eq!(relation.tag("from"), Some("a"));
    }

    #[test]
    fn test_merged_metadata_is_derived() {
        let merged = multi_atlas(&[shard_with("a", "a", 10, &[10])]);
        assert!(!merged.metadata().original);
        assert_eq!(merged.name(), "a");
    }

    #[test]
    fn test_merged_metadata_names_sources() {
        let merged = multi_atlas(&[
            shard_with("2-1-1", "a", 10, &[10]),
            shard_with("2-2-1", "b", 11, &[11]),
        ]);
        assert_eq!(merged.name(), "2-1-1+2-2-1");
        assert_eq!(
            merged.metadata().tags.get(SOURCES_TAG).map(String::as_str),
            Some("2-1-1,2-2-1")
        );
        assert_eq!(merged.metadata().shard, None);
    }

    #[test]
    fn test_empty_input_gives_empty_atlas() {
        let merged = multi_atlas(&[]);
        assert_eq!(merged.number_of_entities(), 0);
        assert_eq!(merged.bounds(), None);
    }
}
