use std::sync::Arc;

use super::{parent_relations, DynamicRelation};
use crate::atlas::{Area, Atlas, AtlasEntity, ItemType, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::{Polygon, Rectangle};

/// Proxy for an [`Area`] of a [`DynamicAtlas`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArea {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicArea {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    /// The area as found in the current snapshot.
    pub fn resolve(&self) -> Result<Arc<Area>> {
        resolve_in(self.atlas.current().as_ref(), self.identifier)
    }

    pub fn polygon(&self) -> Result<Polygon> {
        Ok(self.resolve()?.polygon.clone())
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

    /// Relations the area is a member of.
    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Area,
            self.identifier,
        ))
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Area>> {
    current
        .area(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Area, identifier))
}
