//! Errors raised by the dynamic atlas.

use thiserror::Error;

use crate::atlas::ItemType;

/// Errors from building, expanding or reading through a dynamic atlas.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicAtlasError {
    /// None of the loaded shards has any data. Only the initial shard set
    /// can cause this, so it means the view was configured wrongly.
    #[error("No data in any of the loaded shards: {shards}")]
    NoData { shards: String },

    /// A proxy's identifier no longer resolves in the current snapshot.
    #[error("Stale {item_type} reference: {identifier} is not in the current atlas")]
    StaleReference { item_type: ItemType, identifier: i64 },

    /// The operation is not available on a dynamic atlas.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The shard set validator refused a rebuild.
    #[error("Shard set rejected: {0}")]
    ShardSetRejected(String),
}

impl DynamicAtlasError {
    pub(crate) fn stale(item_type: ItemType, identifier: i64) -> Self {
        DynamicAtlasError::StaleReference {
            item_type,
            identifier,
        }
    }
}

/// Result alias for dynamic atlas operations.
pub type Result<T> = std::result::Result<T, DynamicAtlasError>;
