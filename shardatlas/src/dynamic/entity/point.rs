use std::sync::Arc;

use super::{parent_relations, DynamicRelation};
use crate::atlas::{Atlas, AtlasEntity, ItemType, Point, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::Location;

/// Proxy for a [`Point`] of a [`DynamicAtlas`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicPoint {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicPoint {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn resolve(&self) -> Result<Arc<Point>> {
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

    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Point,
            self.identifier,
        ))
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Point>> {
    current
        .point(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Point, identifier))
}
