//! shardatlas - sharded map features with a lazily expanding view
//!
//! Map features (areas, lines, points, nodes, edges, relations) are stored
//! cut into shards, one snapshot per slippy map tile. A
//! [`DynamicAtlas`](dynamic::DynamicAtlas) starts from a few shards and pulls
//! in neighbouring ones whenever a feature it is about to return continues
//! past what is loaded.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator tile math
//! - [`geometry`] - planar lat/lon shapes and predicates
//! - [`sharding`] - shards and the tile sharding strategy
//! - [`atlas`] - immutable feature snapshots and their merge
//! - [`fetch`] - shard to snapshot fetchers (directory, in-memory slicer)
//! - [`dynamic`] - the expanding atlas, its policy and proxy entities
//! - [`config`] - INI configuration
//! - [`logging`] - tracing setup

pub mod atlas;
pub mod config;
pub mod coord;
pub mod dynamic;
pub mod fetch;
pub mod geometry;
pub mod logging;
pub mod sharding;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
