use std::sync::Arc;

use super::{parent_relations, DynamicNode, DynamicRelation};
use crate::atlas::{Atlas, AtlasEntity, Edge, ItemType, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::{PolyLine, Rectangle};

/// Proxy for a network [`Edge`] of a [`DynamicAtlas`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicEdge {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicEdge {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn resolve(&self) -> Result<Arc<Edge>> {
        resolve_in(self.atlas.current().as_ref(), self.identifier)
    }

    pub fn polyline(&self) -> Result<PolyLine> {
        Ok(self.resolve()?.polyline.clone())
    }

    pub fn length_meters(&self) -> Result<f64> {
        Ok(self.resolve()?.polyline.length_meters())
    }

    pub fn tags(&self) -> Result<Tags> {
        Ok(self.resolve()?.tags.clone())
    }

    pub fn tag(&self, key: &str) -> Result<Option<String>> {
        Ok(self.resolve()?.tag(key).map(str::to_string))
    }

    pub fn bounds(&self) -> Result<Option<Rectangle>> {
        Ok(self.resolve()?.bounds())
    }

    /// The node this edge leaves from.
    pub fn start(&self) -> Result<DynamicNode> {
        let edge = self.resolve()?;
        Ok(DynamicNode::new(self.atlas.clone(), edge.start_node))
    }

    /// The node this edge arrives at.
    pub fn end(&self) -> Result<DynamicNode> {
        let edge = self.resolve()?;
        Ok(DynamicNode::new(self.atlas.clone(), edge.end_node))
    }

    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Edge,
            self.identifier,
        ))
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Edge>> {
    current
        .edge(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Edge, identifier))
}
