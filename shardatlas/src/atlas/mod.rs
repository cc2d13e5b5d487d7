//! Atlases: immutable, queryable collections of map features.
//!
//! An atlas holds six kinds of features:
//!
//! ```text
//! Node ──── Edge ──── Node      navigable network
//! Area   Line   Point           standalone geometry
//! Relation { members → any kind, relations included }
//! ```
//!
//! [`PackedAtlas`] is the in-memory implementation every shard is loaded
//! into, and [`multi_atlas`] merges several of them into one view.

mod entity;
mod metadata;
mod multi;
mod packed;
mod traits;

pub use entity::{
    Area, AtlasEntity, Edge, ItemType, Line, Node, Point, Relation, RelationMember, Tags,
};
pub use metadata::AtlasMetaData;
pub use multi::{multi_atlas, SOURCES_TAG};
pub use packed::{AtlasContents, PackedAtlas, PackedAtlasBuilder};
pub use traits::Atlas;
