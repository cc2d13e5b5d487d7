//! Shard files on disk.
//!
//! Each shard lives in its own file named after the shard:
//!
//! ```text
//! <directory>/
//!   10-511-340.json
//!   10-512-340.json
//!   ...
//! ```
//!
//! Files hold [`AtlasContents`] encoded as JSON or bincode.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::AtlasFetcher;
use crate::atlas::{Atlas, AtlasContents, PackedAtlas};
use crate::sharding::Shard;

/// Errors reading or writing shard files.
#[derive(Debug, Error)]
pub enum ShardFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Unknown shard file format '{0}' (expected json or bincode)")]
    UnknownFormat(String),
}

/// Encoding of shard files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardFileFormat {
    #[default]
    Json,
    Bincode,
}

impl ShardFileFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ShardFileFormat::Json => "json",
            ShardFileFormat::Bincode => "bin",
        }
    }

    /// Format matching a file extension, if any.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "json" => Some(ShardFileFormat::Json),
            "bin" => Some(ShardFileFormat::Bincode),
            _ => None,
        }
    }

    fn encode(&self, contents: &AtlasContents) -> Result<Vec<u8>, ShardFileError> {
        Ok(match self {
            ShardFileFormat::Json => serde_json::to_vec_pretty(contents)?,
            ShardFileFormat::Bincode => bincode::serialize(contents)?,
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<AtlasContents, ShardFileError> {
        Ok(match self {
            ShardFileFormat::Json => serde_json::from_slice(bytes)?,
            ShardFileFormat::Bincode => bincode::deserialize(bytes)?,
        })
    }
}

impl fmt::Display for ShardFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardFileFormat::Json => write!(f, "json"),
            ShardFileFormat::Bincode => write!(f, "bincode"),
        }
    }
}

impl FromStr for ShardFileFormat {
    type Err = ShardFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ShardFileFormat::Json),
            "bincode" | "bin" => Ok(ShardFileFormat::Bincode),
            other => Err(ShardFileError::UnknownFormat(other.to_string())),
        }
    }
}

/// Read a whole atlas file.
pub fn read_atlas_file(path: &Path, format: ShardFileFormat) -> Result<PackedAtlas, ShardFileError> {
    let bytes = fs::read(path)?;
    Ok(PackedAtlas::from_contents(format.decode(&bytes)?))
}

/// Write a whole atlas to a file.
pub fn write_atlas_file(
    path: &Path,
    atlas: &PackedAtlas,
    format: ShardFileFormat,
) -> Result<(), ShardFileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format.encode(&atlas.to_contents())?)?;
    Ok(())
}

/// Write `atlas` as the file for `shard` in `directory`.
///
/// Returns the path written.
pub fn write_shard(
    directory: &Path,
    shard: &Shard,
    atlas: &PackedAtlas,
    format: ShardFileFormat,
) -> Result<PathBuf, ShardFileError> {
    let path = shard_path(directory, shard, format);
    write_atlas_file(&path, atlas, format)?;
    debug!(shard = %shard, path = %path.display(), "Wrote shard file");
    Ok(path)
}

fn shard_path(directory: &Path, shard: &Shard, format: ShardFileFormat) -> PathBuf {
    directory.join(format!("{}.{}", shard, format.extension()))
}

/// Fetches shards from a directory of shard files.
#[derive(Debug, Clone)]
pub struct DirectoryAtlasFetcher {
    directory: PathBuf,
    format: ShardFileFormat,
}

impl DirectoryAtlasFetcher {
    pub fn new(directory: impl Into<PathBuf>, format: ShardFileFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn format(&self) -> ShardFileFormat {
        self.format
    }

    /// Path of the file holding `shard`.
    pub fn path_for(&self, shard: &Shard) -> PathBuf {
        shard_path(&self.directory, shard, self.format)
    }

    /// Shards with a file present in the directory.
    pub fn available_shards(&self) -> Result<Vec<Shard>, ShardFileError> {
        let mut shards = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.format.extension()) {
                continue;
            }
            if let Some(shard) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<Shard>().ok())
            {
                shards.push(shard);
            }
        }
        shards.sort();
        Ok(shards)
    }
}

impl AtlasFetcher for DirectoryAtlasFetcher {
    fn fetch(&self, shard: &Shard) -> Option<Arc<dyn Atlas>> {
        let path = self.path_for(shard);
        if !path.exists() {
            debug!(shard = %shard, path = %path.display(), "No shard file");
            return None;
        }

        match read_atlas_file(&path, self.format) {
            Ok(atlas) if atlas.number_of_entities() == 0 => {
                debug!(shard = %shard, "Shard file is empty");
                None
            }
            Ok(atlas) => {
                debug!(
                    shard = %shard,
                    entities = atlas.number_of_entities(),
                    "Loaded shard file"
                );
                Some(Arc::new(atlas))
            }
            Err(e) => {
                warn!(shard = %shard, path = %path.display(), error = %e, "Unreadable shard file");
                None
            }
        }
    }
}
