//! The dynamic atlas façade.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::entity::{
    DynamicArea, DynamicEdge, DynamicLine, DynamicNode, DynamicPoint, DynamicRelation,
};
use super::error::{DynamicAtlasError, Result};
use super::expander::DynamicAtlasExpander;
use super::policy::DynamicAtlasPolicy;
use crate::atlas::{Area, Atlas, AtlasEntity, AtlasMetaData, Edge, Line, Node, Point, Relation};
use crate::geometry::Rectangle;
use crate::sharding::Shard;

/// An atlas that loads neighbouring shards on demand so that the features it
/// returns are not cut off at shard boundaries.
///
/// Queries that return features go through the expander first; counts,
/// bounds and metadata read the current snapshot as is. Features come back
/// as proxies re-resolved on every access.
///
/// The handle is cheap to clone; clones share the same shard cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shardatlas::atlas::{Atlas, Line, PackedAtlasBuilder};
/// use shardatlas::dynamic::{DynamicAtlas, DynamicAtlasPolicy};
/// use shardatlas::fetch::SlicedAtlasFetcher;
/// use shardatlas::geometry::{Location, PolyLine};
/// use shardatlas::sharding::{Shard, SlippyTileSharding};
///
/// let mut raw = PackedAtlasBuilder::new("raw");
/// raw.add_line(Line::new(
///     1,
///     PolyLine::new(vec![Location::new(20.0, -20.0), Location::new(20.0, 20.0)]),
/// ));
/// let fetcher = Arc::new(SlicedAtlasFetcher::new(Arc::new(raw.build())));
///
/// let west = Shard::new(2, 1, 1).unwrap();
/// let policy = DynamicAtlasPolicy::new([west], Arc::new(SlippyTileSharding::new(2)), fetcher);
/// let atlas = DynamicAtlas::new(policy).unwrap();
///
/// let lines = atlas.lines().unwrap();
/// assert_eq!(lines.len(), 1);
/// assert_eq!(atlas.shards_loaded().len(), 2);
/// ```
#[derive(Clone)]
pub struct DynamicAtlas {
    expander: Arc<DynamicAtlasExpander>,
}

impl DynamicAtlas {
    /// Build the atlas and load the policy's initial shards.
    ///
    /// # Errors
    ///
    /// [`DynamicAtlasError::NoData`] if none of the initial shards has data.
    pub fn new(policy: DynamicAtlasPolicy) -> Result<Self> {
        Ok(Self {
            expander: Arc::new(DynamicAtlasExpander::new(policy)?),
        })
    }

    pub fn policy(&self) -> &DynamicAtlasPolicy {
        self.expander.policy()
    }

    /// The current snapshot.
    pub fn current(&self) -> Arc<dyn Atlas> {
        self.expander.current()
    }

    pub fn expander(&self) -> &DynamicAtlasExpander {
        &self.expander
    }

    // Introspection

    pub fn shards_explored(&self) -> BTreeSet<Shard> {
        self.expander.shards_explored()
    }

    pub fn shards_loaded(&self) -> BTreeSet<Shard> {
        self.expander.shards_loaded()
    }

    pub fn rebuild_count(&self) -> usize {
        self.expander.rebuild_count()
    }

    pub fn is_preemptive_load_done(&self) -> bool {
        self.expander.is_preemptive_load_done()
    }

    /// Load everything a deferred policy postponed. See
    /// [`DynamicAtlasExpander::preemptive_load`].
    pub fn preemptive_load(&self) -> Result<()> {
        self.expander.preemptive_load()
    }

    /// Always fails: a dynamic atlas is a view, not something to persist.
    pub fn save(&self, path: &Path) -> Result<()> {
        Err(DynamicAtlasError::Unsupported(format!(
            "a dynamic atlas cannot be saved (to {})",
            path.display()
        )))
    }

    // Bulk and metadata, from the current snapshot

    pub fn name(&self) -> String {
        self.current().name().to_string()
    }

    pub fn metadata(&self) -> AtlasMetaData {
        self.current().metadata().clone()
    }

    pub fn bounds(&self) -> Option<Rectangle> {
        self.current().bounds()
    }

    pub fn number_of_nodes(&self) -> usize {
        self.current().number_of_nodes()
    }

    pub fn number_of_edges(&self) -> usize {
        self.current().number_of_edges()
    }

    pub fn number_of_areas(&self) -> usize {
        self.current().number_of_areas()
    }

    pub fn number_of_lines(&self) -> usize {
        self.current().number_of_lines()
    }

    pub fn number_of_points(&self) -> usize {
        self.current().number_of_points()
    }

    pub fn number_of_relations(&self) -> usize {
        self.current().number_of_relations()
    }

    pub fn number_of_entities(&self) -> usize {
        self.current().number_of_entities()
    }

    fn select<T, P>(
        &self,
        fetch: impl Fn(&dyn Atlas) -> Vec<Arc<T>>,
        covered: fn(&DynamicAtlasExpander, &T) -> Result<bool>,
        wrap: fn(DynamicAtlas, i64) -> P,
    ) -> Result<Vec<P>>
    where
        T: AtlasEntity,
    {
        Ok(self
            .expander
            .expand(fetch, covered)?
            .iter()
            .map(|entity| wrap(self.clone(), entity.identifier()))
            .collect())
    }

    // Areas

    pub fn area(&self, identifier: i64) -> Result<Option<DynamicArea>> {
        Ok(self
            .select(
                |a| a.area(identifier).into_iter().collect(),
                DynamicAtlasExpander::area_covered,
                DynamicArea::new,
            )?
            .pop())
    }

    pub fn areas(&self) -> Result<Vec<DynamicArea>> {
        self.select(
            |a| a.areas(),
            DynamicAtlasExpander::area_covered,
            DynamicArea::new,
        )
    }

    pub fn areas_matching(&self, matcher: impl Fn(&Area) -> bool) -> Result<Vec<DynamicArea>> {
        self.select(
            |a| a.areas().into_iter().filter(|x| matcher(x.as_ref())).collect(),
            DynamicAtlasExpander::area_covered,
            DynamicArea::new,
        )
    }

    pub fn areas_intersecting(&self, bounds: &Rectangle) -> Result<Vec<DynamicArea>> {
        self.select(
            |a| a.areas_intersecting(bounds),
            DynamicAtlasExpander::area_covered,
            DynamicArea::new,
        )
    }

    pub fn areas_intersecting_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Area) -> bool,
    ) -> Result<Vec<DynamicArea>> {
        self.select(
            |a| {
                a.areas_intersecting(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::area_covered,
            DynamicArea::new,
        )
    }

    // Lines

    pub fn line(&self, identifier: i64) -> Result<Option<DynamicLine>> {
        Ok(self
            .select(
                |a| a.line(identifier).into_iter().collect(),
                DynamicAtlasExpander::line_covered,
                DynamicLine::new,
            )?
            .pop())
    }

    pub fn lines(&self) -> Result<Vec<DynamicLine>> {
        self.select(
            |a| a.lines(),
            DynamicAtlasExpander::line_covered,
            DynamicLine::new,
        )
    }

    pub fn lines_matching(&self, matcher: impl Fn(&Line) -> bool) -> Result<Vec<DynamicLine>> {
        self.select(
            |a| a.lines().into_iter().filter(|x| matcher(x.as_ref())).collect(),
            DynamicAtlasExpander::line_covered,
            DynamicLine::new,
        )
    }

    pub fn lines_intersecting(&self, bounds: &Rectangle) -> Result<Vec<DynamicLine>> {
        self.select(
            |a| a.lines_intersecting(bounds),
            DynamicAtlasExpander::line_covered,
            DynamicLine::new,
        )
    }

    pub fn lines_intersecting_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Line) -> bool,
    ) -> Result<Vec<DynamicLine>> {
        self.select(
            |a| {
                a.lines_intersecting(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::line_covered,
            DynamicLine::new,
        )
    }

    // Points

    pub fn point(&self, identifier: i64) -> Result<Option<DynamicPoint>> {
        Ok(self
            .select(
                |a| a.point(identifier).into_iter().collect(),
                DynamicAtlasExpander::point_covered,
                DynamicPoint::new,
            )?
            .pop())
    }

    pub fn points(&self) -> Result<Vec<DynamicPoint>> {
        self.select(
            |a| a.points(),
            DynamicAtlasExpander::point_covered,
            DynamicPoint::new,
        )
    }

    pub fn points_matching(&self, matcher: impl Fn(&Point) -> bool) -> Result<Vec<DynamicPoint>> {
        self.select(
            |a| a.points().into_iter().filter(|x| matcher(x.as_ref())).collect(),
            DynamicAtlasExpander::point_covered,
            DynamicPoint::new,
        )
    }

    pub fn points_within(&self, bounds: &Rectangle) -> Result<Vec<DynamicPoint>> {
        self.select(
            |a| a.points_within(bounds),
            DynamicAtlasExpander::point_covered,
            DynamicPoint::new,
        )
    }

    pub fn points_within_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Point) -> bool,
    ) -> Result<Vec<DynamicPoint>> {
        self.select(
            |a| {
                a.points_within(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::point_covered,
            DynamicPoint::new,
        )
    }

    // Nodes

    pub fn node(&self, identifier: i64) -> Result<Option<DynamicNode>> {
        Ok(self
            .select(
                |a| a.node(identifier).into_iter().collect(),
                DynamicAtlasExpander::node_covered,
                DynamicNode::new,
            )?
            .pop())
    }

    pub fn nodes(&self) -> Result<Vec<DynamicNode>> {
        self.select(
            |a| a.nodes(),
            DynamicAtlasExpander::node_covered,
            DynamicNode::new,
        )
    }

    pub fn nodes_matching(&self, matcher: impl Fn(&Node) -> bool) -> Result<Vec<DynamicNode>> {
        self.select(
            |a| a.nodes().into_iter().filter(|x| matcher(x.as_ref())).collect(),
            DynamicAtlasExpander::node_covered,
            DynamicNode::new,
        )
    }

    pub fn nodes_within(&self, bounds: &Rectangle) -> Result<Vec<DynamicNode>> {
        self.select(
            |a| a.nodes_within(bounds),
            DynamicAtlasExpander::node_covered,
            DynamicNode::new,
        )
    }

    pub fn nodes_within_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Node) -> bool,
    ) -> Result<Vec<DynamicNode>> {
        self.select(
            |a| {
                a.nodes_within(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::node_covered,
            DynamicNode::new,
        )
    }

    // Edges

    pub fn edge(&self, identifier: i64) -> Result<Option<DynamicEdge>> {
        Ok(self
            .select(
                |a| a.edge(identifier).into_iter().collect(),
                DynamicAtlasExpander::edge_covered,
                DynamicEdge::new,
            )?
            .pop())
    }

    pub fn edges(&self) -> Result<Vec<DynamicEdge>> {
        self.select(
            |a| a.edges(),
            DynamicAtlasExpander::edge_covered,
            DynamicEdge::new,
        )
    }

    pub fn edges_matching(&self, matcher: impl Fn(&Edge) -> bool) -> Result<Vec<DynamicEdge>> {
        self.select(
            |a| a.edges().into_iter().filter(|x| matcher(x.as_ref())).collect(),
            DynamicAtlasExpander::edge_covered,
            DynamicEdge::new,
        )
    }

    pub fn edges_intersecting(&self, bounds: &Rectangle) -> Result<Vec<DynamicEdge>> {
        self.select(
            |a| a.edges_intersecting(bounds),
            DynamicAtlasExpander::edge_covered,
            DynamicEdge::new,
        )
    }

    pub fn edges_intersecting_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Edge) -> bool,
    ) -> Result<Vec<DynamicEdge>> {
        self.select(
            |a| {
                a.edges_intersecting(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::edge_covered,
            DynamicEdge::new,
        )
    }

    // Relations

    pub fn relation(&self, identifier: i64) -> Result<Option<DynamicRelation>> {
        Ok(self
            .select(
                |a| a.relation(identifier).into_iter().collect(),
                DynamicAtlasExpander::relation_covered,
                DynamicRelation::new,
            )?
            .pop())
    }

    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        self.select(
            |a| a.relations(),
            DynamicAtlasExpander::relation_covered,
            DynamicRelation::new,
        )
    }

    pub fn relations_matching(
        &self,
        matcher: impl Fn(&Relation) -> bool,
    ) -> Result<Vec<DynamicRelation>> {
        self.select(
            |a| {
                a.relations()
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::relation_covered,
            DynamicRelation::new,
        )
    }

    pub fn relations_intersecting(&self, bounds: &Rectangle) -> Result<Vec<DynamicRelation>> {
        self.select(
            |a| a.relations_intersecting(bounds),
            DynamicAtlasExpander::relation_covered,
            DynamicRelation::new,
        )
    }

    pub fn relations_intersecting_matching(
        &self,
        bounds: &Rectangle,
        matcher: impl Fn(&Relation) -> bool,
    ) -> Result<Vec<DynamicRelation>> {
        self.select(
            |a| {
                a.relations_intersecting(bounds)
                    .into_iter()
                    .filter(|x| matcher(x.as_ref()))
                    .collect()
            },
            DynamicAtlasExpander::relation_covered,
            DynamicRelation::new,
        )
    }
}

impl PartialEq for DynamicAtlas {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.expander, &other.expander)
    }
}

impl fmt::Debug for DynamicAtlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAtlas")
            .field("explored", &self.expander.shards_explored().len())
            .field("loaded", &self.expander.shards_loaded().len())
            .field("rebuilds", &self.expander.rebuild_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{ItemType, PackedAtlas, PackedAtlasBuilder, RelationMember};
    use crate::fetch::SlicedAtlasFetcher;
    use crate::geometry::{Location, PolyLine, Polygon};
    use crate::sharding::SlippyTileSharding;

    fn west() -> Shard {
        Shard::new(2, 1, 1).unwrap()
    }

    fn east() -> Shard {
        Shard::new(2, 2, 1).unwrap()
    }

    fn raw() -> PackedAtlas {
        let mut builder = PackedAtlasBuilder::new("raw");
        builder
            .add_area(
                Area::new(
                    1,
                    Polygon::new(vec![
                        Location::new(10.0, -30.0),
                        Location::new(20.0, -30.0),
                        Location::new(20.0, -20.0),
                    ]),
                )
                .with_tag("landuse", "forest"),
            )
            .add_line(Line::new(
                2,
                PolyLine::new(vec![Location::new(30.0, -10.0), Location::new(30.0, 10.0)]),
            ))
            .add_node(Node::new(3, Location::new(40.0, -5.0)))
            .add_node(Node::new(4, Location::new(40.0, 5.0)))
            .add_edge(Edge::new(
                5,
                PolyLine::new(vec![Location::new(40.0, -5.0), Location::new(40.0, 5.0)]),
                3,
                4,
            ))
            .add_relation(Relation::new(
                6,
                vec![
                    RelationMember::new(ItemType::Area, 1, "outer"),
                    RelationMember::new(ItemType::Edge, 5, "route"),
                ],
            ));
        builder.build()
    }

    fn atlas() -> DynamicAtlas {
        let fetcher = Arc::new(SlicedAtlasFetcher::new(Arc::new(raw())));
        let policy =
            DynamicAtlasPolicy::new([west()], Arc::new(SlippyTileSharding::new(2)), fetcher);
        DynamicAtlas::new(policy).unwrap()
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_lookup_inside_initial_shard() {
            let atlas = atlas();
            let area = atlas.area(1).unwrap().unwrap();
            assert_eq!(area.tag("landuse").unwrap(), Some("forest".to_string()));
            assert_eq!(atlas.shards_loaded(), BTreeSet::from([west()]));
            assert_eq!(atlas.rebuild_count(), 0);
        }

        #[test]
        fn test_missing_identifier_is_none() {
            assert!(atlas().line(99).unwrap().is_none());
        }

        #[test]
        fn test_crossing_line_loads_neighbour() {
            let atlas = atlas();
            let line = atlas.line(2).unwrap().unwrap();
            assert_eq!(line.polyline().unwrap().locations().len(), 2);
            assert!(atlas.shards_loaded().contains(&east()));
        }

        #[test]
        fn test_matching_filters_results() {
            let atlas = atlas();
            let forests = atlas
                .areas_matching(|a| a.tags.get("landuse").map(String::as_str) == Some("forest"))
                .unwrap();
            assert_eq!(forests.len(), 1);
            assert!(atlas.areas_matching(|_| false).unwrap().is_empty());
        }

        #[test]
        fn test_spatial_queries() {
            let atlas = atlas();
            let around_nodes = Rectangle::new(35.0, 45.0, -10.0, -1.0);
            let nodes = atlas.nodes_within(&around_nodes).unwrap();
            assert_eq!(nodes.iter().map(DynamicNode::identifier).collect::<Vec<_>>(), vec![3]);
            assert_eq!(atlas.edges_intersecting(&around_nodes).unwrap().len(), 1);
            assert_eq!(atlas.relations_intersecting(&around_nodes).unwrap().len(), 1);
        }

        #[test]
        fn test_save_is_unsupported() {
            assert!(matches!(
                atlas().save(Path::new("/tmp/dynamic.atlas")),
                Err(DynamicAtlasError::Unsupported(_))
            ));
        }
    }

    mod proxy_tests {
        use super::*;

        #[test]
        fn test_edge_endpoints_are_proxies() {
            let atlas = atlas();
            let edge = atlas.edge(5).unwrap().unwrap();
            let end = edge.end().unwrap();
            assert_eq!(end.identifier(), 4);
            assert_eq!(end.location().unwrap(), Location::new(40.0, 5.0));
            assert_eq!(end.in_edges().unwrap(), vec![edge.clone()]);
            assert!(end.out_edges().unwrap().is_empty());
        }

        #[test]
        fn test_relation_members_and_parents() {
            let atlas = atlas();
            let relation = atlas.relation(6).unwrap().unwrap();
            let members = relation.members().unwrap();
            assert_eq!(members.len(), 2);
            assert_eq!(members[0].role, "outer");
            assert_eq!(members[0].entity.item_type(), ItemType::Area);

            let area = atlas.area(1).unwrap().unwrap();
            assert_eq!(area.relations().unwrap(), vec![relation]);
        }

        #[test]
        fn test_proxy_survives_rebuild() {
            let atlas = atlas();
            let area = atlas.area(1).unwrap().unwrap();
            let before = area.polygon().unwrap();

            atlas.lines().unwrap();
            assert!(atlas.rebuild_count() > 0);
            assert_eq!(area.polygon().unwrap(), before);
        }

        #[test]
        fn test_unknown_identifier_is_stale() {
            let stale = DynamicArea::new(atlas(), 404);
            assert_eq!(
                stale.tags(),
                Err(DynamicAtlasError::StaleReference {
                    item_type: ItemType::Area,
                    identifier: 404,
                })
            );
        }
    }
}
