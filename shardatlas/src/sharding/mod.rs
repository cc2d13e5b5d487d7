//! Shards and sharding strategies.
//!
//! A [`Shard`] is one tile of the partitioned dataset. A [`Sharding`] answers
//! the two questions the dynamic view keeps asking while it expands: which
//! shards does this geometry touch, and which shards surround this one.

mod shard;
mod slippy;

pub use shard::{Shard, ShardParseError};
pub use slippy::SlippyTileSharding;

use std::collections::BTreeSet;

use crate::geometry::{Location, PolyLine, Polygon, Rectangle};

/// Strategy mapping geometries to the shards that hold them.
///
/// Implementations must be deterministic: the same geometry always maps to
/// the same shards.
pub trait Sharding: Send + Sync + std::fmt::Debug {
    /// Shards needed to fully enclose the polygon.
    fn shards_for(&self, polygon: &Polygon) -> BTreeSet<Shard>;

    /// Shards the polyline passes through.
    fn shards_intersecting(&self, polyline: &PolyLine) -> BTreeSet<Shard>;

    /// Shards containing the location (several when it lies on an edge).
    fn shards_covering(&self, location: Location) -> BTreeSet<Shard>;

    /// Shards adjacent to `shard`.
    fn neighbors(&self, shard: &Shard) -> BTreeSet<Shard>;

    /// Shards overlapping a bounding box.
    fn shards_for_bounds(&self, bounds: &Rectangle) -> BTreeSet<Shard> {
        self.shards_for(&Polygon::new(bounds.corners().to_vec()))
    }
}
