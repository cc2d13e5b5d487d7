//! Dynamic, lazily expanding atlas.
//!
//! A [`DynamicAtlas`] starts from a set of shards and loads neighbouring
//! shards whenever a feature it is about to return continues beyond what is
//! loaded. Features are never handed out cut off at a shard boundary.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │ areas(), line(id), edges_intersecting(..), ...
//!   ▼
//! DynamicAtlas ──────────── counts, bounds, metadata ──┐
//!   │ expand                                            │
//!   ▼                                                   ▼
//! DynamicAtlasExpander ── fetch ──▶ AtlasFetcher    current snapshot
//!   │  explored shards               (per shard)     (single shard or
//!   │  coverage checks                                multi_atlas merge)
//!   ▼
//! DynamicArea / DynamicLine / ... proxies (identifier + atlas handle)
//! ```
//!
//! # Expansion policy
//!
//! [`DynamicAtlasPolicy`] supplies the initial shards, the sharding, the
//! fetcher and three flags:
//!
//! - **extend indefinitely**: without it, only features touching the initial
//!   shards cause loading
//! - **defer loading**: shards found while browsing are only fetched by
//!   [`DynamicAtlas::preemptive_load`], which iterates to a fixed point
//! - **aggressively explore relations**: the fixed point also pulls in
//!   neighbours that hold more members of relations already in view
//!
//! # Relations
//!
//! Relations are never clipped at shard boundaries, so their coverage is best
//! effort: each member is checked with its own kind's rule, members not in
//! the current snapshot are skipped, and cycles are logged and skipped.

mod atlas;
mod entity;
mod error;
mod expander;
mod policy;

pub use atlas::DynamicAtlas;
pub use entity::{
    DynamicArea, DynamicEdge, DynamicEntity, DynamicLine, DynamicNode, DynamicPoint,
    DynamicRelation, DynamicRelationMember,
};
pub use error::{DynamicAtlasError, Result};
pub use expander::DynamicAtlasExpander;
pub use policy::{DynamicAtlasPolicy, EntityFilter, ShardSetValidator};
