//! Shard fetchers.
//!
//! A fetcher turns a [`Shard`] into the snapshot holding that shard's
//! features, or `None` when the shard has no data. "Could not read" and
//! "nothing there" are deliberately the same answer at this level; a fetcher
//! that needs to tell them apart logs the difference itself.
//!
//! # Implementations
//!
//! - [`DirectoryAtlasFetcher`]: one file per shard in a directory
//! - [`SlicedAtlasFetcher`]: slices shards on demand out of one raw atlas
//! - any `Fn(&Shard) -> Option<Arc<dyn Atlas>>` closure

mod directory;
mod sliced;

pub use directory::{
    read_atlas_file, write_atlas_file, write_shard, DirectoryAtlasFetcher, ShardFileError,
    ShardFileFormat,
};
pub use sliced::{slice_shard, SlicedAtlasFetcher};

use std::sync::Arc;

use crate::atlas::Atlas;
use crate::sharding::Shard;

/// Source of per-shard snapshots.
///
/// # Thread Safety
///
/// Fetchers are shared by the dynamic atlas through `Arc<dyn AtlasFetcher>`
/// and must be `Send + Sync`.
pub trait AtlasFetcher: Send + Sync {
    /// Load the snapshot for `shard`, `None` if it has no data.
    fn fetch(&self, shard: &Shard) -> Option<Arc<dyn Atlas>>;
}

impl<F> AtlasFetcher for F
where
    F: Fn(&Shard) -> Option<Arc<dyn Atlas>> + Send + Sync,
{
    fn fetch(&self, shard: &Shard) -> Option<Arc<dyn Atlas>> {
        self(shard)
    }
}
