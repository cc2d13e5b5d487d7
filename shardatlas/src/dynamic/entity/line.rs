use std::sync::Arc;

use super::{parent_relations, DynamicRelation};
use crate::atlas::{Atlas, AtlasEntity, ItemType, Line, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::{PolyLine, Rectangle};

/// Proxy for a [`Line`] of a [`DynamicAtlas`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicLine {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicLine {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    /// The line as found in the current snapshot.
    pub fn resolve(&self) -> Result<Arc<Line>> {
        resolve_in(self.atlas.current().as_ref(), self.identifier)
    }

    pub fn polyline(&self) -> Result<PolyLine> {
        Ok(self.resolve()?.polyline.clone())
    }

    /// Length along the line, in metres.
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

    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Line,
            self.identifier,
        ))
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Line>> {
    current
        .line(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Line, identifier))
}
