//! Proxy entities.
//!
//! A proxy holds its owning [`DynamicAtlas`] and an identifier, nothing else.
//! Every accessor resolves the identifier against the atlas's current
//! snapshot at call time, so a proxy stays usable across rebuilds as long as
//! its feature is still in view. A feature that has disappeared yields
//! [`DynamicAtlasError::StaleReference`](super::DynamicAtlasError::StaleReference).
//!
//! Accessors returning related features (edge endpoints, incident edges,
//! parent relations, relation members) hand out fresh proxies, never the raw
//! features of the snapshot they were found in.

mod area;
mod edge;
mod line;
mod node;
mod point;
mod relation;

pub use area::DynamicArea;
pub use edge::DynamicEdge;
pub use line::DynamicLine;
pub use node::DynamicNode;
pub use point::DynamicPoint;
pub use relation::DynamicRelation;

use std::fmt;

use super::error::Result;
use super::DynamicAtlas;
use crate::atlas::{Atlas, ItemType, Tags};

/// A proxy of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicEntity {
    Area(DynamicArea),
    Line(DynamicLine),
    Point(DynamicPoint),
    Node(DynamicNode),
    Edge(DynamicEdge),
    Relation(DynamicRelation),
}

impl DynamicEntity {
    pub(crate) fn from_member(atlas: &DynamicAtlas, item_type: ItemType, identifier: i64) -> Self {
        let atlas = atlas.clone();
        match item_type {
            ItemType::Area => DynamicEntity::Area(DynamicArea::new(atlas, identifier)),
            ItemType::Line => DynamicEntity::Line(DynamicLine::new(atlas, identifier)),
            ItemType::Point => DynamicEntity::Point(DynamicPoint::new(atlas, identifier)),
            ItemType::Node => DynamicEntity::Node(DynamicNode::new(atlas, identifier)),
            ItemType::Edge => DynamicEntity::Edge(DynamicEdge::new(atlas, identifier)),
            ItemType::Relation => DynamicEntity::Relation(DynamicRelation::new(atlas, identifier)),
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            DynamicEntity::Area(_) => ItemType::Area,
            DynamicEntity::Line(_) => ItemType::Line,
            DynamicEntity::Point(_) => ItemType::Point,
            DynamicEntity::Node(_) => ItemType::Node,
            DynamicEntity::Edge(_) => ItemType::Edge,
            DynamicEntity::Relation(_) => ItemType::Relation,
        }
    }

    pub fn identifier(&self) -> i64 {
        match self {
            DynamicEntity::Area(e) => e.identifier(),
            DynamicEntity::Line(e) => e.identifier(),
            DynamicEntity::Point(e) => e.identifier(),
            DynamicEntity::Node(e) => e.identifier(),
            DynamicEntity::Edge(e) => e.identifier(),
            DynamicEntity::Relation(e) => e.identifier(),
        }
    }

    pub fn tags(&self) -> Result<Tags> {
        match self {
            DynamicEntity::Area(e) => e.tags(),
            DynamicEntity::Line(e) => e.tags(),
            DynamicEntity::Point(e) => e.tags(),
            DynamicEntity::Node(e) => e.tags(),
            DynamicEntity::Edge(e) => e.tags(),
            DynamicEntity::Relation(e) => e.tags(),
        }
    }

    /// Relations the feature is a member of.
    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        match self {
            DynamicEntity::Area(e) => e.relations(),
            DynamicEntity::Line(e) => e.relations(),
            DynamicEntity::Point(e) => e.relations(),
            DynamicEntity::Node(e) => e.relations(),
            DynamicEntity::Edge(e) => e.relations(),
            DynamicEntity::Relation(e) => e.relations(),
        }
    }
}

impl fmt::Display for DynamicEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.item_type(), self.identifier())
    }
}

/// A relation member as a proxy, with its role.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRelationMember {
    pub role: String,
    pub entity: DynamicEntity,
}

fn parent_relations(
    atlas: &DynamicAtlas,
    current: &dyn Atlas,
    item_type: ItemType,
    identifier: i64,
) -> Vec<DynamicRelation> {
    current
        .relations_with_member(item_type, identifier)
        .iter()
        .map(|r| DynamicRelation::new(atlas.clone(), r.identifier))
        .collect()
}
