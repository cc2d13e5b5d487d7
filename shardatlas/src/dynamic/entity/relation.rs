use std::sync::Arc;

use super::{parent_relations, DynamicEntity, DynamicRelationMember};
use crate::atlas::{Atlas, AtlasEntity, ItemType, Relation, Tags};
use crate::dynamic::error::{DynamicAtlasError, Result};
use crate::dynamic::DynamicAtlas;
use crate::geometry::Rectangle;

/// Proxy for a [`Relation`] of a [`DynamicAtlas`].
///
/// Members are listed as the current snapshot knows them: loading more shards
/// may add members to the same relation.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRelation {
    atlas: DynamicAtlas,
    identifier: i64,
}

impl DynamicRelation {
    pub(crate) fn new(atlas: DynamicAtlas, identifier: i64) -> Self {
        Self { atlas, identifier }
    }

    pub fn identifier(&self) -> i64 {
        self.identifier
    }

    pub fn resolve(&self) -> Result<Arc<Relation>> {
        resolve_in(self.atlas.current().as_ref(), self.identifier)
    }

    pub fn tags(&self) -> Result<Tags> {
        Ok(self.resolve()?.tags.clone())
    }

    pub fn tag(&self, key: &str) -> Result<Option<String>> {
        Ok(self.resolve()?.tag(key).map(str::to_string))
    }

    /// Members present in the current snapshot, as proxies.
    pub fn members(&self) -> Result<Vec<DynamicRelationMember>> {
        let current = self.atlas.current();
        let relation = resolve_in(current.as_ref(), self.identifier)?;
        Ok(relation
            .members
            .iter()
            .filter(|m| current.contains_entity(m.item_type, m.identifier))
            .map(|m| DynamicRelationMember {
                role: m.role.clone(),
                entity: DynamicEntity::from_member(&self.atlas, m.item_type, m.identifier),
            })
            .collect())
    }

    /// Bounds of the members the current snapshot holds.
    pub fn bounds(&self) -> Result<Option<Rectangle>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(current.relation_bounds(self.identifier))
    }

    /// Relations this relation is a member of.
    pub fn relations(&self) -> Result<Vec<DynamicRelation>> {
        let current = self.atlas.current();
        resolve_in(current.as_ref(), self.identifier)?;
        Ok(parent_relations(
            &self.atlas,
            current.as_ref(),
            ItemType::Relation,
            self.identifier,
        ))
    }
}

fn resolve_in(current: &dyn Atlas, identifier: i64) -> Result<Arc<Relation>> {
    current
        .relation(identifier)
        .ok_or_else(|| DynamicAtlasError::stale(ItemType::Relation, identifier))
}
