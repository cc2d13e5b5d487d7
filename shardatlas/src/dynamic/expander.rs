//! Shard cache and expander.
//!
//! The expander owns the map of explored shards and the current snapshot,
//! and grows both until every feature handed out is fully covered.
//!
//! # Shard states
//!
//! ```text
//!              requested                 fetched
//! unexplored ───────────▶ Pending ───────────────▶ Fetched(Some(atlas))
//!                                         └──────▶ Fetched(None)
//! ```
//!
//! Entries are never removed. Pending shards count as explored: while loading
//! is deferred they wait for the next rebuild to be fetched.
//!
//! # Rebuilds
//!
//! The current snapshot is replaced only when the set of shards holding data
//! differs from the one it was built from. A single loaded shard becomes the
//! current snapshot as is; several are merged with [`multi_atlas`].

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use super::error::{DynamicAtlasError, Result};
use super::policy::DynamicAtlasPolicy;
use crate::atlas::{
    multi_atlas, Area, Atlas, AtlasEntity, Edge, ItemType, Line, Node, PackedAtlasBuilder, Point,
    Relation,
};
use crate::geometry::{Location, PolyLine, Polygon};
use crate::sharding::Shard;

#[derive(Debug, Clone)]
enum ShardEntry {
    /// Explored, waiting to be fetched at the next rebuild.
    Pending,
    /// Fetched; `None` when the shard has no data.
    Fetched(Option<Arc<dyn Atlas>>),
}

#[derive(Debug, Default)]
struct ShardCache {
    explored: BTreeMap<Shard, ShardEntry>,
    /// Shards the current snapshot was built from.
    used_for_current: BTreeSet<Shard>,
}

impl ShardCache {
    fn loaded(&self) -> BTreeSet<Shard> {
        self.explored
            .iter()
            .filter(|(_, entry)| matches!(entry, ShardEntry::Fetched(Some(_))))
            .map(|(shard, _)| *shard)
            .collect()
    }

    fn is_explored(&self, shard: &Shard) -> bool {
        self.explored.contains_key(shard)
    }
}

/// The shard cache and expansion engine behind a
/// [`DynamicAtlas`](super::DynamicAtlas).
///
/// # Thread Safety
///
/// Internal state sits behind locks so the expander can be shared, but
/// expansion is meant to be driven from one thread at a time. Snapshot
/// replacement is a single swap under a write lock: readers see either the
/// old snapshot or the new one.
#[derive(Debug)]
pub struct DynamicAtlasExpander {
    policy: DynamicAtlasPolicy,
    cache: Mutex<ShardCache>,
    current: RwLock<Arc<dyn Atlas>>,
    rebuild_count: AtomicUsize,
    preemptive_load_done: AtomicBool,
}

impl DynamicAtlasExpander {
    /// Create the expander and synchronously load the initial shards.
    ///
    /// # Errors
    ///
    /// [`DynamicAtlasError::NoData`] when none of the initial shards has data,
    /// or [`DynamicAtlasError::ShardSetRejected`] from the validator.
    pub fn new(policy: DynamicAtlasPolicy) -> Result<Self> {
        let empty: Arc<dyn Atlas> = Arc::new(PackedAtlasBuilder::new("empty").build());
        let expander = Self {
            policy,
            cache: Mutex::new(ShardCache::default()),
            current: RwLock::new(empty),
            rebuild_count: AtomicUsize::new(0),
            preemptive_load_done: AtomicBool::new(false),
        };

        {
            let mut cache = expander.cache.lock();
            for shard in expander.policy.initial_shards() {
                cache.explored.insert(*shard, ShardEntry::Pending);
            }
            expander.rebuild(&mut cache)?;
        }

        info!(
            initial_shards = expander.policy.initial_shards().len(),
            loaded = expander.shards_loaded().len(),
            "Dynamic atlas initialized"
        );
        Ok(expander)
    }

    pub fn policy(&self) -> &DynamicAtlasPolicy {
        &self.policy
    }

    /// The current snapshot.
    pub fn current(&self) -> Arc<dyn Atlas> {
        self.current.read().clone()
    }

    /// Every explored shard, pending or fetched, with or without data.
    pub fn shards_explored(&self) -> BTreeSet<Shard> {
        self.cache.lock().explored.keys().copied().collect()
    }

    /// Shards with data the current snapshot is built from.
    ///
    /// Shards fetched but refused by the shard set validator are not
    /// included.
    pub fn shards_loaded(&self) -> BTreeSet<Shard> {
        self.cache.lock().used_for_current.clone()
    }

    /// Number of merged snapshots built so far.
    pub fn rebuild_count(&self) -> usize {
        self.rebuild_count.load(Ordering::SeqCst)
    }

    pub fn is_preemptive_load_done(&self) -> bool {
        self.preemptive_load_done.load(Ordering::SeqCst)
    }

    /// Record shards as explored and rebuild unless loading is deferred.
    ///
    /// Shards already explored are ignored.
    pub fn add_new_shards(&self, shards: impl IntoIterator<Item = Shard>) -> Result<()> {
        let mut cache = self.cache.lock();
        let mut added = 0;
        for shard in shards {
            if !cache.is_explored(&shard) {
                debug!(shard = %shard, "Shard requested");
                cache.explored.insert(shard, ShardEntry::Pending);
                added += 1;
            }
        }
        if added == 0 {
            return Ok(());
        }

        if !self.policy.defer_loading() || self.is_preemptive_load_done() {
            self.rebuild(&mut cache)?;
        } else {
            debug!(added, "Loading deferred until preemptive load");
        }
        Ok(())
    }

    /// Fetch pending shards and rebuild the current snapshot if the set of
    /// shards with data changed.
    pub fn build_underlying_multi_atlas(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        self.rebuild(&mut cache)
    }

    fn rebuild(&self, cache: &mut ShardCache) -> Result<()> {
        let pending: Vec<Shard> = cache
            .explored
            .iter()
            .filter(|(_, entry)| matches!(entry, ShardEntry::Pending))
            .map(|(shard, _)| *shard)
            .collect();
        for shard in pending {
            let atlas = self.policy.fetch(&shard);
            debug!(shard = %shard, has_data = atlas.is_some(), "Fetched shard");
            cache.explored.insert(shard, ShardEntry::Fetched(atlas));
        }

        let loaded = cache.loaded();
        if loaded.is_empty() {
            let shards = cache
                .explored
                .keys()
                .map(Shard::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(DynamicAtlasError::NoData { shards });
        }
        if loaded == cache.used_for_current {
            trace!(shards = loaded.len(), "Shard set unchanged, skipping rebuild");
            return Ok(());
        }

        self.policy
            .validate(&loaded)
            .map_err(DynamicAtlasError::ShardSetRejected)?;

        let atlases: Vec<Arc<dyn Atlas>> = loaded
            .iter()
            .filter_map(|shard| match cache.explored.get(shard) {
                Some(ShardEntry::Fetched(Some(atlas))) => Some(atlas.clone()),
                _ => None,
            })
            .collect();

        let next: Arc<dyn Atlas> = match atlases.as_slice() {
            [single] => single.clone(),
            several => {
                self.rebuild_count.fetch_add(1, Ordering::SeqCst);
                Arc::new(multi_atlas(several))
            }
        };
        *self.current.write() = next;

        info!(
            shards = loaded.len(),
            rebuilds = self.rebuild_count(),
            "Rebuilt current atlas"
        );
        cache.used_for_current = loaded;
        Ok(())
    }

    /// Fail while fetched shards are missing from the current snapshot.
    ///
    /// That only happens after the validator refused a rebuild. The set is
    /// validated again, so a refusal keeps failing every query instead of
    /// letting features through uncovered.
    fn check_unmerged_shards(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        let loaded = cache.loaded();
        if loaded == cache.used_for_current {
            return Ok(());
        }
        self.policy
            .validate(&loaded)
            .map_err(DynamicAtlasError::ShardSetRejected)?;
        self.rebuild(&mut cache)
    }

    /// Request `needed` if any of it is unexplored.
    ///
    /// Returns whether every needed shard was already explored.
    fn require_shards(&self, needed: BTreeSet<Shard>) -> Result<bool> {
        let missing = {
            let cache = self.cache.lock();
            needed.iter().any(|shard| !cache.is_explored(shard))
        };
        if missing {
            self.add_new_shards(needed)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Whether the shards around a polygon are all explored.
    pub fn polygon_covered(&self, polygon: &Polygon) -> Result<bool> {
        if !self.policy.extend_indefinitely()
            && !self.policy.initial_bounds().overlaps_polygon(polygon)
        {
            return Ok(true);
        }
        self.require_shards(self.policy.sharding().shards_for(polygon))
    }

    /// Whether the shards a polyline crosses are all explored.
    pub fn polyline_covered(&self, polyline: &PolyLine) -> Result<bool> {
        if !self.policy.extend_indefinitely()
            && !self.policy.initial_bounds().overlaps_polyline(polyline)
        {
            return Ok(true);
        }
        self.require_shards(self.policy.sharding().shards_intersecting(polyline))
    }

    /// Whether the shards containing a location are all explored.
    pub fn location_covered(&self, location: Location) -> Result<bool> {
        if !self.policy.extend_indefinitely()
            && !self.policy.initial_bounds().fully_encloses(location)
        {
            return Ok(true);
        }
        self.require_shards(self.policy.sharding().shards_covering(location))
    }

    pub fn area_covered(&self, area: &Area) -> Result<bool> {
        self.polygon_covered(&area.polygon)
    }

    pub fn line_covered(&self, line: &Line) -> Result<bool> {
        self.polyline_covered(&line.polyline)
    }

    pub fn edge_covered(&self, edge: &Edge) -> Result<bool> {
        self.polyline_covered(&edge.polyline)
    }

    pub fn point_covered(&self, point: &Point) -> Result<bool> {
        self.location_covered(point.location)
    }

    pub fn node_covered(&self, node: &Node) -> Result<bool> {
        self.location_covered(node.location)
    }

    /// Whether every member of a relation, nested relations included, is
    /// covered.
    ///
    /// Members missing from the current snapshot are skipped. A nested
    /// relation already on the path being walked is a cycle: it is logged
    /// and treated as covered.
    pub fn relation_covered(&self, relation: &Relation) -> Result<bool> {
        let current = self.current();
        let mut path = HashSet::from([relation.identifier]);
        self.members_covered(current.as_ref(), relation, &mut path)
    }

    fn members_covered(
        &self,
        current: &dyn Atlas,
        relation: &Relation,
        path: &mut HashSet<i64>,
    ) -> Result<bool> {
        let mut covered = true;
        for member in &relation.members {
            let id = member.identifier;
            let member_covered = match member.item_type {
                ItemType::Area => match current.area(id) {
                    Some(area) => self.area_covered(&area)?,
                    None => true,
                },
                ItemType::Line => match current.line(id) {
                    Some(line) => self.line_covered(&line)?,
                    None => true,
                },
                ItemType::Edge => match current.edge(id) {
                    Some(edge) => self.edge_covered(&edge)?,
                    None => true,
                },
                ItemType::Point => match current.point(id) {
                    Some(point) => self.point_covered(&point)?,
                    None => true,
                },
                ItemType::Node => match current.node(id) {
                    Some(node) => self.node_covered(&node)?,
                    None => true,
                },
                ItemType::Relation => {
                    if path.contains(&id) {
                        warn!(
                            relation = relation.identifier,
                            member = id,
                            "Relation cycle detected, skipping member"
                        );
                        true
                    } else {
                        match current.relation(id) {
                            Some(nested) => {
                                path.insert(id);
                                let nested_covered =
                                    self.members_covered(current, &nested, path);
                                path.remove(&id);
                                nested_covered?
                            }
                            None => true,
                        }
                    }
                }
            };
            covered &= member_covered;
        }
        Ok(covered)
    }

    /// Whether any member of the relation overlaps the initial shards.
    ///
    /// A cycle contributes nothing here, unlike in [`Self::relation_covered`]
    /// where it counts as covered.
    fn relation_overlaps_initial_bounds(&self, current: &dyn Atlas, relation: &Relation) -> bool {
        let mut path = HashSet::from([relation.identifier]);
        self.members_overlap_initial_bounds(current, relation, &mut path)
    }

    fn members_overlap_initial_bounds(
        &self,
        current: &dyn Atlas,
        relation: &Relation,
        path: &mut HashSet<i64>,
    ) -> bool {
        let initial = self.policy.initial_bounds();
        relation.members.iter().any(|member| {
            let id = member.identifier;
            match member.item_type {
                ItemType::Area => current
                    .area(id)
                    .is_some_and(|a| initial.overlaps_polygon(&a.polygon)),
                ItemType::Line => current
                    .line(id)
                    .is_some_and(|l| initial.overlaps_polyline(&l.polyline)),
                ItemType::Edge => current
                    .edge(id)
                    .is_some_and(|e| initial.overlaps_polyline(&e.polyline)),
                ItemType::Point => current
                    .point(id)
                    .is_some_and(|p| initial.overlaps_location(p.location)),
                ItemType::Node => current
                    .node(id)
                    .is_some_and(|n| initial.overlaps_location(n.location)),
                ItemType::Relation => {
                    if !path.insert(id) {
                        return false;
                    }
                    let overlaps = current.relation(id).is_some_and(|nested| {
                        self.members_overlap_initial_bounds(current, &nested, path)
                    });
                    path.remove(&id);
                    overlaps
                }
            }
        })
    }

    /// Fetch candidates from the current snapshot until all of them that the
    /// policy cares about are covered.
    ///
    /// Candidates are fetched again on every pass since a pass may have
    /// replaced the snapshot. Under a deferred, bounded policy whose
    /// preemptive load already ran, the first pass is final.
    pub fn expand<T, F, C>(&self, fetch: F, covered: C) -> Result<Vec<Arc<T>>>
    where
        T: AtlasEntity,
        F: Fn(&dyn Atlas) -> Vec<Arc<T>>,
        C: Fn(&Self, &T) -> Result<bool>,
    {
        let mut passes = 0usize;
        loop {
            passes += 1;
            self.check_unmerged_shards()?;
            let current = self.current();
            let candidates = fetch(current.as_ref());

            let mut all_covered = true;
            for candidate in &candidates {
                let entity: &T = candidate;
                if !self.policy.requires_coverage(entity) {
                    continue;
                }
                if !covered(self, entity)? {
                    all_covered = false;
                }
            }

            if all_covered {
                trace!(passes, candidates = candidates.len(), "Expansion complete");
                return Ok(candidates);
            }
            if self.policy.defer_loading()
                && !self.policy.extend_indefinitely()
                && self.is_preemptive_load_done()
            {
                return Ok(candidates);
            }
        }
    }

    /// Run every kind of feature through [`Self::expand`].
    fn browse_all(&self) -> Result<()> {
        self.expand(|a| a.areas(), Self::area_covered)?;
        self.expand(|a| a.lines(), Self::line_covered)?;
        self.expand(|a| a.points(), Self::point_covered)?;
        self.expand(|a| a.nodes(), Self::node_covered)?;
        self.expand(|a| a.edges(), Self::edge_covered)?;
        self.expand(|a| a.relations(), Self::relation_covered)?;
        Ok(())
    }

    /// Load everything a deferred policy postponed, to a fixed point.
    ///
    /// Browses all features, rebuilds, and browses again until the explored
    /// shard set stops growing; a feature invisible before a neighbour was
    /// loaded may need yet another shard. Runs once: later calls are no-ops.
    pub fn preemptive_load(&self) -> Result<()> {
        if !self.policy.defer_loading() {
            warn!("Preemptive load requested without deferred loading, ignoring");
            return Ok(());
        }
        if self.is_preemptive_load_done() {
            debug!("Preemptive load already done");
            return Ok(());
        }

        let aggressive = self.policy.aggressively_explore_relations()
            && !self.policy.extend_indefinitely()
            && self.policy.defer_loading();

        self.browse_all()?;
        let mut passes = 0usize;
        loop {
            self.build_underlying_multi_atlas()?;
            let before = self.shards_explored().len();

            self.browse_all()?;
            if aggressive {
                self.explore_relations()?;
            }

            passes += 1;
            let after = self.shards_explored().len();
            debug!(passes, before, after, "Convergence pass");
            if after == before {
                break;
            }
            if self
                .policy
                .max_convergence_passes()
                .is_some_and(|max| passes >= max)
            {
                warn!(passes, "Convergence pass limit reached, stopping preemptive load");
                self.build_underlying_multi_atlas()?;
                break;
            }
        }

        self.preemptive_load_done.store(true, Ordering::SeqCst);
        info!(
            passes,
            explored = self.shards_explored().len(),
            loaded = self.shards_loaded().len(),
            rebuilds = self.rebuild_count(),
            "Preemptive load complete"
        );
        Ok(())
    }

    /// Load unexplored neighbours that hold more members of relations
    /// already in view.
    ///
    /// Neighbour snapshots are fetched directly, outside the lazy path. A
    /// neighbour is kept when one of its relations exists in the current
    /// snapshot, overlaps the initial shards, and lists members the current
    /// copy lacks.
    fn explore_relations(&self) -> Result<()> {
        let (loaded, explored) = {
            let cache = self.cache.lock();
            (cache.loaded(), cache.explored.keys().copied().collect::<BTreeSet<_>>())
        };
        let candidates: BTreeSet<Shard> = loaded
            .iter()
            .flat_map(|shard| self.policy.sharding().neighbors(shard))
            .filter(|shard| !explored.contains(shard))
            .collect();

        let current = self.current();
        let mut required: Vec<(Shard, Arc<dyn Atlas>)> = Vec::new();
        for neighbor in candidates {
            let Some(atlas) = self.policy.fetch(&neighbor) else {
                continue;
            };
            let needed = atlas.relations().iter().any(|relation| {
                let Some(existing) = current.relation(relation.identifier) else {
                    return false;
                };
                self.relation_overlaps_initial_bounds(current.as_ref(), &existing)
                    && relation
                        .members
                        .iter()
                        .any(|m| !existing.has_member(m.item_type, m.identifier))
            });
            if needed {
                debug!(shard = %neighbor, "Neighbour holds more relation members");
                required.push((neighbor, atlas));
            }
        }

        if !required.is_empty() {
            let mut cache = self.cache.lock();
            for (shard, atlas) in required {
                cache
                    .explored
                    .entry(shard)
                    .or_insert(ShardEntry::Fetched(Some(atlas)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{PackedAtlas, RelationMember};
    use crate::fetch::SlicedAtlasFetcher;
    use crate::sharding::SlippyTileSharding;

    // Zoom 2: tile (x=1,y=1) spans lon -90..0, (x=2,y=1) lon 0..90, lat 0..~66.5
    fn west() -> Shard {
        Shard::new(2, 1, 1).unwrap()
    }

    fn east() -> Shard {
        Shard::new(2, 2, 1).unwrap()
    }

    fn raw() -> PackedAtlas {
        let mut builder = PackedAtlasBuilder::new("raw");
        builder
            .add_point(Point::new(1, Location::new(10.0, -10.0)))
            .add_line(Line::new(
                2,
                PolyLine::new(vec![Location::new(20.0, -20.0), Location::new(20.0, 20.0)]),
            ))
            .add_point(Point::new(3, Location::new(10.0, 10.0)));
        builder.build()
    }

    fn expander(
        raw: PackedAtlas,
        configure: impl Fn(DynamicAtlasPolicy) -> DynamicAtlasPolicy,
    ) -> (DynamicAtlasExpander, Arc<SlicedAtlasFetcher>) {
        let fetcher = Arc::new(SlicedAtlasFetcher::new(Arc::new(raw)));
        let policy = DynamicAtlasPolicy::new(
            [west()],
            Arc::new(SlippyTileSharding::new(2)),
            fetcher.clone(),
        );
        (DynamicAtlasExpander::new(configure(policy)).unwrap(), fetcher)
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn test_initial_single_shard_is_not_merged() {
            let (expander, _) = expander(raw(), |p| p);
            assert_eq!(expander.shards_loaded(), BTreeSet::from([west()]));
            assert_eq!(expander.rebuild_count(), 0);
            assert!(expander.current().point(1).is_some());
        }

        #[test]
        fn test_initial_shards_without_data_fail() {
            let fetcher = |_: &Shard| -> Option<Arc<dyn Atlas>> { None };
            let policy = DynamicAtlasPolicy::new(
                [west()],
                Arc::new(SlippyTileSharding::new(2)),
                Arc::new(fetcher),
            );
            assert!(matches!(
                DynamicAtlasExpander::new(policy),
                Err(DynamicAtlasError::NoData { .. })
            ));
        }

        #[test]
        fn test_adding_known_shards_does_nothing() {
            let (expander, fetcher) = expander(raw(), |p| p);
            expander.add_new_shards([west()]).unwrap();
            assert_eq!(fetcher.fetch_count(), 1);
            assert_eq!(expander.rebuild_count(), 0);
        }

        #[test]
        fn test_new_shard_with_data_triggers_merge() {
            let (expander, _) = expander(raw(), |p| p);
            expander.add_new_shards([east()]).unwrap();
            assert_eq!(expander.rebuild_count(), 1);
            assert!(expander.current().point(3).is_some());
        }

        #[test]
        fn test_empty_shard_is_explored_but_not_loaded() {
            let (expander, _) = expander(raw(), |p| p);
            let empty = Shard::new(2, 0, 3).unwrap();
            expander.add_new_shards([empty]).unwrap();
            assert!(expander.shards_explored().contains(&empty));
            assert!(!expander.shards_loaded().contains(&empty));
            assert_eq!(expander.rebuild_count(), 0);
        }

        #[test]
        fn test_validator_rejection_aborts_rebuild() {
            let (expander, _) = expander(raw(), |p| {
                p.with_shard_set_validator(|shards| {
                    if shards.len() > 1 {
                        Err("one shard only".to_string())
                    } else {
                        Ok(())
                    }
                })
            });
            assert_eq!(
                expander.add_new_shards([east()]),
                Err(DynamicAtlasError::ShardSetRejected("one shard only".to_string()))
            );
            assert!(expander.current().point(3).is_none());
            assert_eq!(expander.shards_loaded(), BTreeSet::from([west()]));
        }

        #[test]
        fn test_validator_rejection_keeps_failing_queries() {
            let (expander, _) = expander(raw(), |p| {
                p.with_shard_set_validator(|shards| {
                    if shards.len() > 1 {
                        Err("one shard only".to_string())
                    } else {
                        Ok(())
                    }
                })
            });
            let rejected = Err(DynamicAtlasError::ShardSetRejected(
                "one shard only".to_string(),
            ));

            // The crossing line needs the east shard, which the validator refuses
            let first = expander.expand(|a| a.lines(), DynamicAtlasExpander::line_covered);
            assert_eq!(first.map(|lines| lines.len()), rejected.clone());
            let second = expander.expand(|a| a.lines(), DynamicAtlasExpander::line_covered);
            assert_eq!(second.map(|lines| lines.len()), rejected);

            assert_eq!(expander.shards_loaded(), BTreeSet::from([west()]));
            assert!(expander.current().point(3).is_none());
        }

        #[test]
        fn test_deferred_shards_stay_pending() {
            let (expander, fetcher) = expander(raw(), |p| p.with_deferred_loading(true));
            expander.add_new_shards([east()]).unwrap();
            assert!(expander.shards_explored().contains(&east()));
            assert!(!expander.shards_loaded().contains(&east()));
            assert_eq!(fetcher.fetch_count(), 1);

            expander.build_underlying_multi_atlas().unwrap();
            assert!(expander.shards_loaded().contains(&east()));
            assert_eq!(fetcher.fetch_count(), 2);
        }
    }

    mod coverage_tests {
        use super::*;

        #[test]
        fn test_crossing_line_pulls_in_neighbour() {
            let (expander, _) = expander(raw(), |p| p);
            let lines = expander
                .expand(|a| a.lines(), DynamicAtlasExpander::line_covered)
                .unwrap();
            assert_eq!(lines.len(), 1);
            assert!(expander.shards_loaded().contains(&east()));
        }

        #[test]
        fn test_crossing_area_pulls_in_neighbour() {
            let mut builder = PackedAtlasBuilder::new("area");
            builder.add_area(Area::new(
                8,
                Polygon::new(vec![
                    Location::new(10.0, -10.0),
                    Location::new(20.0, -10.0),
                    Location::new(20.0, 10.0),
                    Location::new(10.0, 10.0),
                ]),
            ));
            let (expander, _) = expander(builder.build(), |p| p);

            let areas = expander
                .expand(|a| a.areas(), DynamicAtlasExpander::area_covered)
                .unwrap();
            assert_eq!(areas.len(), 1);
            assert_eq!(expander.shards_loaded(), BTreeSet::from([west(), east()]));
            assert_eq!(expander.rebuild_count(), 1);
        }

        #[test]
        fn test_relation_member_crossing_pulls_in_neighbour() {
            let mut builder = PackedAtlasBuilder::new("relation");
            builder
                .add_line(Line::new(
                    2,
                    PolyLine::new(vec![Location::new(20.0, -20.0), Location::new(20.0, 20.0)]),
                ))
                .add_relation(Relation::new(
                    7,
                    vec![RelationMember::new(ItemType::Line, 2, "route")],
                ));
            let (expander, _) = expander(builder.build(), |p| p);
            assert_eq!(expander.shards_explored(), BTreeSet::from([west()]));

            let relations = expander
                .expand(|a| a.relations(), DynamicAtlasExpander::relation_covered)
                .unwrap();
            assert_eq!(relations.len(), 1);
            assert_eq!(expander.shards_loaded(), BTreeSet::from([west(), east()]));
        }

        #[test]
        fn test_feature_outside_initial_bounds_is_ignored_when_bounded() {
            let (expander, _) = expander(raw(), |p| p);
            let far = Point::new(9, Location::new(-40.0, 120.0));
            assert!(expander.point_covered(&far).unwrap());
            assert_eq!(expander.shards_explored(), BTreeSet::from([west()]));
        }

        #[test]
        fn test_entity_filter_skips_coverage() {
            let (expander, _) = expander(raw(), |p| {
                p.with_entity_filter(|e| e.item_type() != ItemType::Line)
            });
            expander
                .expand(|a| a.lines(), DynamicAtlasExpander::line_covered)
                .unwrap();
            assert_eq!(expander.shards_explored(), BTreeSet::from([west()]));
        }

        #[test]
        fn test_self_referencing_relation_is_covered() {
            let mut builder = PackedAtlasBuilder::new("cycle");
            builder
                .add_point(Point::new(1, Location::new(10.0, -10.0)))
                .add_relation(Relation::new(
                    5,
                    vec![
                        RelationMember::new(ItemType::Point, 1, "label"),
                        RelationMember::new(ItemType::Relation, 5, "self"),
                    ],
                ));
            let (expander, _) = expander(builder.build(), |p| p);
            let relation = expander.current().relation(5).unwrap();
            assert!(expander.relation_covered(&relation).unwrap());
            assert!(!expander.relation_overlaps_initial_bounds(
                expander.current().as_ref(),
                &Relation::new(6, vec![RelationMember::new(ItemType::Relation, 6, "")])
            ));
        }
    }

    mod preemptive_tests {
        use super::*;

        #[test]
        fn test_preemptive_load_without_deferral_is_noop() {
            let (expander, _) = expander(raw(), |p| p);
            expander.preemptive_load().unwrap();
            assert!(!expander.is_preemptive_load_done());
        }

        #[test]
        fn test_preemptive_load_converges_and_is_idempotent() {
            let (expander, _) = expander(raw(), |p| p.with_deferred_loading(true));
            expander.preemptive_load().unwrap();
            assert!(expander.is_preemptive_load_done());
            assert!(expander.shards_loaded().contains(&east()));

            let explored = expander.shards_explored();
            let rebuilds = expander.rebuild_count();
            expander.preemptive_load().unwrap();
            assert_eq!(expander.shards_explored(), explored);
            assert_eq!(expander.rebuild_count(), rebuilds);
        }

        /// Lines chaining west → east → (2,3,1) → (2,3,2): each shard loaded
        /// reveals a line needing the next one.
        fn chain() -> PackedAtlas {
            let mut builder = PackedAtlasBuilder::new("chain");
            builder
                .add_point(Point::new(1, Location::new(10.0, -10.0)))
                .add_line(Line::new(
                    2,
                    PolyLine::new(vec![Location::new(20.0, -20.0), Location::new(20.0, 20.0)]),
                ))
                .add_line(Line::new(
                    4,
                    PolyLine::new(vec![Location::new(30.0, 10.0), Location::new(30.0, 100.0)]),
                ))
                .add_line(Line::new(
                    5,
                    PolyLine::new(vec![
                        Location::new(30.0, 120.0),
                        Location::new(-30.0, 120.0),
                    ]),
                ));
            builder.build()
        }

        fn far_north_east() -> Shard {
            Shard::new(2, 3, 1).unwrap()
        }

        fn far_south_east() -> Shard {
            Shard::new(2, 3, 2).unwrap()
        }

        #[test]
        fn test_unbounded_convergence_follows_the_chain() {
            let (expander, _) = expander(chain(), |p| {
                p.with_extend_indefinitely(true).with_deferred_loading(true)
            });
            expander.preemptive_load().unwrap();
            assert_eq!(
                expander.shards_loaded(),
                BTreeSet::from([west(), east(), far_north_east(), far_south_east()])
            );
        }

        #[test]
        fn test_convergence_cap_stops_early() {
            let (expander, _) = expander(chain(), |p| {
                p.with_extend_indefinitely(true)
                    .with_deferred_loading(true)
                    .with_max_convergence_passes(Some(1))
            });
            expander.preemptive_load().unwrap();

            assert!(expander.is_preemptive_load_done());
            // Shards requested by the last pass are still merged
            assert_eq!(
                expander.shards_loaded(),
                BTreeSet::from([west(), east(), far_north_east()])
            );
            assert!(!expander.shards_explored().contains(&far_south_east()));
        }
    }
}
