use std::sync::Arc;

use super::{parent_relations, DynamicEdge, DynamicRelation};
use crate::atlas::{Atlas, AtlasEntity, Edge, ItemType, Node, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::Location;

/// Proxy for a network [`Node`] of a [`DynamicAtlas`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicNode {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicNode {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn resolve(&self) -> Result<Arc<Node>> {
        resolve_in(self.atlas.current().as_ref(), self.identifier)
    }

    pub fn location(&self) -> Result<Location> {
        Ok(self.resolve()?.location)
    }

    pub fn tags(&self) -> Result<Tags> {
        Ok(self.resolve()?.tags.clone())
    }

    pub fn tag(&self, key: &str) -> Result<Option<String>> {
        Ok(self.resolve()?.tag(key).map(str::to_string))
    }

    /// Edges ending at this node.
    pub fn in_edges(&self) -> Result<Vec<DynamicEdge>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(self.wrap(current.edges_ending_at(self.identifier)))
    }

    /// Edges starting at this node.
    pub fn out_edges(&self) -> Result<Vec<DynamicEdge>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(self.wrap(current.edges_starting_at(self.identifier)))
    }

    /// Edges starting or ending here, ordered by identifier.
    pub fn connected_edges(&self) -> Result<Vec<DynamicEdge>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        let mut edges = current.edges_ending_at(self.identifier);
        edges.extend(current.edges_starting_at(self.identifier));
        edges.sort_by_key(|e| e.identifier);
        edges.dedup_by_key(|e| e.identifier);
        Ok(self.wrap(edges))
    }

    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Node,
            self.identifier,
        ))
    }

    fn wrap(&self, edges: Vec<Arc<Edge>>) -> Vec<DynamicEdge> {
        edges
            .iter()
            .map(|e| DynamicEdge::new(self.atlas.clone(), e.identifier))
            .collect()
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Node>> {
    current
        .node(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Node, identifier))
}
