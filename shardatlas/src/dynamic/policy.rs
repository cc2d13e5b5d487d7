//! How a dynamic atlas grows.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::atlas::{Atlas, AtlasEntity};
use crate::config::ExpansionSettings;
use crate::fetch::AtlasFetcher;
use crate::geometry::{MultiRectangle, Rectangle};
use crate::sharding::{Shard, Sharding};

/// Decides which features must be fully covered by loaded shards.
pub type EntityFilter = Arc<dyn Fn(&dyn AtlasEntity) -> bool + Send + Sync>;

/// Checked before every rebuild with the shards about to be merged.
/// Returning an error aborts the rebuild.
pub type ShardSetValidator = Arc<dyn Fn(&BTreeSet<Shard>) -> Result<(), String> + Send + Sync>;

/// Expansion policy of a [`DynamicAtlas`](super::DynamicAtlas).
///
/// # Flags
///
/// | Flag | Effect |
/// |------|--------|
/// | `extend_indefinitely` | Features anywhere pull in shards; otherwise only features touching the initial shards do |
/// | `defer_loading` | Shards discovered while browsing are only fetched by [`preemptive_load`](super::DynamicAtlas::preemptive_load) |
/// | `aggressively_explore_relations` | The convergence pass also loads neighbours holding more members of known relations |
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shardatlas::atlas::Atlas;
/// use shardatlas::dynamic::DynamicAtlasPolicy;
/// use shardatlas::geometry::Rectangle;
/// use shardatlas::sharding::{Shard, SlippyTileSharding};
///
/// let fetcher = |_: &Shard| -> Option<Arc<dyn Atlas>> { None };
/// let policy = DynamicAtlasPolicy::from_bounds(
///     &Rectangle::new(48.0, 48.5, 2.0, 2.5),
///     Arc::new(SlippyTileSharding::new(10)),
///     Arc::new(fetcher),
/// )
/// .with_deferred_loading(true);
///
/// assert!(policy.defer_loading());
/// assert!(!policy.initial_shards().is_empty());
/// ```
#[derive(Clone)]
pub struct DynamicAtlasPolicy {
    initial_shards: BTreeSet<Shard>,
    initial_bounds: MultiRectangle,
    sharding: Arc<dyn Sharding>,
    fetcher: Arc<dyn AtlasFetcher>,
    extend_indefinitely: bool,
    defer_loading: bool,
    aggressively_explore_relations: bool,
    entity_filter: EntityFilter,
    shard_set_validator: ShardSetValidator,
    max_convergence_passes: Option<usize>,
}

impl DynamicAtlasPolicy {
    /// Create a policy starting from an explicit shard set.
    pub fn new(
        initial_shards: impl IntoIterator<Item = Shard>,
        sharding: Arc<dyn Sharding>,
        fetcher: Arc<dyn AtlasFetcher>,
    ) -> Self {
        let initial_shards: BTreeSet<Shard> = initial_shards.into_iter().collect();
        let initial_bounds = initial_shards.iter().map(Shard::bounds).collect();
        Self {
            initial_shards,
            initial_bounds,
            sharding,
            fetcher,
            extend_indefinitely: false,
            defer_loading: false,
            aggressively_explore_relations: false,
            entity_filter: Arc::new(|_: &dyn AtlasEntity| true),
            shard_set_validator: Arc::new(|_: &BTreeSet<Shard>| Ok(())),
            max_convergence_passes: None,
        }
    }

    /// Create a policy starting from the shards overlapping `bounds`.
    pub fn from_bounds(
        bounds: &Rectangle,
        sharding: Arc<dyn Sharding>,
        fetcher: Arc<dyn AtlasFetcher>,
    ) -> Self {
        let initial_shards = sharding.shards_for_bounds(bounds);
        Self::new(initial_shards, sharding, fetcher)
    }

    pub fn with_extend_indefinitely(mut self, extend_indefinitely: bool) -> Self {
        self.extend_indefinitely = extend_indefinitely;
        self
    }

    pub fn with_deferred_loading(mut self, defer_loading: bool) -> Self {
        self.defer_loading = defer_loading;
        self
    }

    pub fn with_aggressively_explore_relations(mut self, aggressive: bool) -> Self {
        self.aggressively_explore_relations = aggressive;
        self
    }

    /// Only features accepted by `filter` are required to be fully covered.
    pub fn with_entity_filter(
        mut self,
        filter: impl Fn(&dyn AtlasEntity) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.entity_filter = Arc::new(filter);
        self
    }

    pub fn with_shard_set_validator(
        mut self,
        validator: impl Fn(&BTreeSet<Shard>) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.shard_set_validator = Arc::new(validator);
        self
    }

    /// Cap the number of convergence passes of a preemptive load.
    pub fn with_max_convergence_passes(mut self, max: Option<usize>) -> Self {
        self.max_convergence_passes = max;
        self
    }

    /// Apply the flags from the `[expansion]` configuration section.
    pub fn with_settings(self, settings: &ExpansionSettings) -> Self {
        self.with_extend_indefinitely(settings.extend_indefinitely)
            .with_deferred_loading(settings.defer_loading)
            .with_aggressively_explore_relations(settings.aggressively_explore_relations)
            .with_max_convergence_passes(settings.max_convergence_passes)
    }

    pub fn initial_shards(&self) -> &BTreeSet<Shard> {
        &self.initial_shards
    }

    /// Union of the initial shards' bounds.
    pub fn initial_bounds(&self) -> &MultiRectangle {
        &self.initial_bounds
    }

    pub fn sharding(&self) -> &dyn Sharding {
        self.sharding.as_ref()
    }

    /// Fetch the snapshot of a shard.
    pub fn fetch(&self, shard: &Shard) -> Option<Arc<dyn Atlas>> {
        self.fetcher.fetch(shard)
    }

    pub fn extend_indefinitely(&self) -> bool {
        self.extend_indefinitely
    }

    pub fn defer_loading(&self) -> bool {
        self.defer_loading
    }

    pub fn aggressively_explore_relations(&self) -> bool {
        self.aggressively_explore_relations
    }

    pub fn max_convergence_passes(&self) -> Option<usize> {
        self.max_convergence_passes
    }

    /// Whether `entity` must be fully covered.
    pub fn requires_coverage(&self, entity: &dyn AtlasEntity) -> bool {
        (self.entity_filter)(entity)
    }

    /// Run the shard set validator.
    pub fn validate(&self, shards: &BTreeSet<Shard>) -> Result<(), String> {
        (self.shard_set_validator)(shards)
    }
}

impl fmt::Debug for DynamicAtlasPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAtlasPolicy")
            .field("initial_shards", &self.initial_shards)
            .field("sharding", &self.sharding)
            .field("extend_indefinitely", &self.extend_indefinitely)
            .field("defer_loading", &self.defer_loading)
            .field(
                "aggressively_explore_relations",
                &self.aggressively_explore_relations,
            )
            .field("max_convergence_passes", &self.max_convergence_passes)
            .finish_non_exhaustive()
    }
}
