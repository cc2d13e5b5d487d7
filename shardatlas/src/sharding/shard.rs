//! The shard identifier: a slippy-map tile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{tile_edges, tiles_per_axis, TileCoord, MAX_ZOOM};
use crate::geometry::Rectangle;

/// A spatial partition of the dataset.
///
/// Shards are Web Mercator tiles identified by `zoom-x-y`, the naming used for
/// shard files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shard {
    /// Zoom level (0-18)
    pub zoom: u8,
    /// Tile column, 0 at the antimeridian going east
    pub x: u32,
    /// Tile row, 0 at the north edge of the map
    pub y: u32,
}

/// Errors parsing a shard name.
#[derive(Debug, Error, PartialEq)]
pub enum ShardParseError {
    /// The name is not of the form `zoom-x-y`.
    #[error("Invalid shard name '{0}': expected zoom-x-y")]
    Format(String),

    /// The zoom level or tile index is out of range.
    #[error("Shard '{0}' is out of range")]
    OutOfRange(String),
}

impl Shard {
    /// Create a shard, returning `None` when the tile does not exist at `zoom`.
    pub fn new(zoom: u8, x: u32, y: u32) -> Option<Self> {
        if zoom > MAX_ZOOM {
            return None;
        }
        let n = tiles_per_axis(zoom);
        (x < n && y < n).then_some(Self { zoom, x, y })
    }

    /// The equivalent tile coordinate.
    pub fn tile(&self) -> TileCoord {
        TileCoord::new(self.y, self.x, self.zoom)
    }

    /// Geographic bounds of the tile.
    pub fn bounds(&self) -> Rectangle {
        let (south, north, west, east) = tile_edges(&self.tile());
        Rectangle::new(south, north, west, east)
    }

    /// The up to eight tiles sharing an edge or a corner with this one.
    ///
    /// Tiles do not wrap around the antimeridian and stop at the map's north
    /// and south edges.
    pub fn neighbors(&self) -> Vec<Shard> {
        let mut neighbors = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = self.x as i64 + dx;
                let y = self.y as i64 + dy;
                if x < 0 || y < 0 {
                    continue;
                }
                if let Some(shard) = Shard::new(self.zoom, x as u32, y as u32) {
                    neighbors.push(shard);
                }
            }
        }
        neighbors
    }

    /// Canonical shard name, `zoom-x-y`.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl From<TileCoord> for Shard {
    fn from(tile: TileCoord) -> Self {
        Self {
            zoom: tile.zoom,
            x: tile.col,
            y: tile.row,
        }
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.zoom, self.x, self.y)
    }
}

impl FromStr for Shard {
    type Err = ShardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [zoom, x, y] = parts.as_slice() else {
            return Err(ShardParseError::Format(s.to_string()));
        };
        let zoom: u8 = zoom
            .parse()
            .map_err(|_| ShardParseError::Format(s.to_string()))?;
        let x: u32 = x.parse().map_err(|_| ShardParseError::Format(s.to_string()))?;
        let y: u32 = y.parse().map_err(|_| ShardParseError::Format(s.to_string()))?;
        Shard::new(zoom, x, y).ok_or_else(|| ShardParseError::OutOfRange(s.to_string()))
    }
}
