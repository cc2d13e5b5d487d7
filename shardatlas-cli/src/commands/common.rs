//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use shardatlas::config::ConfigFile;
use shardatlas::dynamic::{DynamicAtlas, DynamicAtlasPolicy};
use shardatlas::fetch::{DirectoryAtlasFetcher, ShardFileFormat};
use shardatlas::geometry::Rectangle;
use shardatlas::sharding::{Shard, SlippyTileSharding};

use crate::error::CliError;

/// Shard file format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum FormatArg {
    /// Human readable JSON (.json)
    Json,
    /// Compact binary (.bin)
    Bincode,
}

impl From<FormatArg> for ShardFileFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => ShardFileFormat::Json,
            FormatArg::Bincode => ShardFileFormat::Bincode,
        }
    }
}

/// Where shard files are read from.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Shard directory (defaults to [store] directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Shard file format (defaults to [store] format)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

impl StoreArgs {
    /// Resolve the directory and format, CLI first, then config.
    pub fn resolve(&self, config: &ConfigFile) -> (PathBuf, ShardFileFormat) {
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| config.store.directory.clone());
        let format = self
            .format
            .map(ShardFileFormat::from)
            .unwrap_or(config.store.format);
        (dir, format)
    }
}

/// Expansion flags. Each one can only switch a setting on; the rest comes
/// from the [expansion] section.
#[derive(Debug, Clone, Default, Args)]
pub struct ExpansionArgs {
    /// Load shards for features anywhere, not only near the initial shards
    #[arg(long)]
    pub extend: bool,

    /// Defer loading of discovered shards until the preemptive load
    #[arg(long)]
    pub defer: bool,

    /// Also load neighbours holding more members of known relations
    #[arg(long)]
    pub aggressive: bool,

    /// Run the preemptive load before querying
    #[arg(long)]
    pub preload: bool,
}

/// Parse `zoom-x-y` shard names.
pub fn parse_shards(values: &[String]) -> Result<Vec<Shard>, CliError> {
    values
        .iter()
        .map(|value| {
            value
                .parse::<Shard>()
                .map_err(|e| CliError::InvalidArgument(format!("shard '{}': {}", value, e)))
        })
        .collect()
}

/// Parse `min_lat,min_lon,max_lat,max_lon`.
pub fn parse_bbox(value: &str) -> Result<Rectangle, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", value, e))?;

    match parts.as_slice() {
        [min_lat, min_lon, max_lat, max_lon] => {
            if min_lat > max_lat || min_lon > max_lon {
                return Err(format!("minimum exceeds maximum in '{}'", value));
            }
            Ok(Rectangle::new(*min_lat, *max_lat, *min_lon, *max_lon))
        }
        _ => Err(format!(
            "expected min_lat,min_lon,max_lat,max_lon, got '{}'",
            value
        )),
    }
}

/// Initial shards of a dynamic atlas: explicit names, or the shards covering
/// `bbox` at the configured zoom.
pub enum InitialShards<'a> {
    Named(&'a [String]),
    Covering(&'a Rectangle),
}

/// Build a dynamic atlas over a shard directory.
pub fn open_dynamic_atlas(
    config: &ConfigFile,
    store: &StoreArgs,
    expansion: &ExpansionArgs,
    initial: InitialShards<'_>,
) -> Result<DynamicAtlas, CliError> {
    let (dir, format) = store.resolve(config);
    if !dir.is_dir() {
        return Err(CliError::Config(format!(
            "shard directory '{}' does not exist",
            dir.display()
        )));
    }
    let fetcher = Arc::new(DirectoryAtlasFetcher::new(dir, format));

    let policy = match initial {
        InitialShards::Named(names) => {
            let shards = parse_shards(names)?;
            let zoom = shard_zoom(&shards)?;
            DynamicAtlasPolicy::new(shards, Arc::new(SlippyTileSharding::new(zoom)), fetcher)
        }
        InitialShards::Covering(bbox) => DynamicAtlasPolicy::from_bounds(
            bbox,
            Arc::new(SlippyTileSharding::new(config.sharding.zoom)),
            fetcher,
        ),
    };

    let settings = &config.expansion;
    let policy = policy
        .with_settings(settings)
        .with_extend_indefinitely(settings.extend_indefinitely || expansion.extend)
        .with_deferred_loading(settings.defer_loading || expansion.defer)
        .with_aggressively_explore_relations(
            settings.aggressively_explore_relations || expansion.aggressive,
        );

    let atlas = DynamicAtlas::new(policy)?;
    if expansion.preload {
        atlas.preemptive_load()?;
    }
    Ok(atlas)
}

/// The common zoom of `shards`.
fn shard_zoom(shards: &[Shard]) -> Result<u8, CliError> {
    let Some(first) = shards.first() else {
        return Err(CliError::InvalidArgument("no shards given".to_string()));
    };
    if shards.iter().any(|shard| shard.zoom != first.zoom) {
        return Err(CliError::InvalidArgument(
            "all shards must share one zoom level".to_string(),
        ));
    }
    Ok(first.zoom)
}

/// Print the shard bookkeeping of a dynamic atlas.
pub fn print_shard_summary(atlas: &DynamicAtlas) {
    let explored = atlas.shards_explored();
    let loaded = atlas.shards_loaded();
    println!("Shards");
    println!("  Explored: {}", explored.len());
    println!("  Loaded:   {}", loaded.len());
    println!("  Rebuilds: {}", atlas.rebuild_count());
    for shard in &explored {
        let state = if loaded.contains(shard) {
            "loaded"
        } else {
            "no data"
        };
        println!("    {} ({})", shard, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("48.0, 2.0, 49.0, 3.0").unwrap();
        assert_eq!(bbox, Rectangle::new(48.0, 49.0, 2.0, 3.0));

        assert!(parse_bbox("48.0,2.0,49.0").is_err());
        assert!(parse_bbox("48.0,2.0,north,3.0").is_err());
        assert!(parse_bbox("49.0,2.0,48.0,3.0").is_err());
    }

    #[test]
    fn test_parse_shards() {
        let shards = parse_shards(&["10-512-340".to_string()]).unwrap();
        assert_eq!(shards, vec![Shard::new(10, 512, 340).unwrap()]);
        assert!(parse_shards(&["10-512".to_string()]).is_err());
    }

    #[test]
    fn test_mixed_zoom_is_rejected() {
        let shards = vec![Shard::new(10, 1, 1).unwrap(), Shard::new(11, 1, 1).unwrap()];
        assert!(shard_zoom(&shards).is_err());
        assert!(shard_zoom(&[]).is_err());
    }

    #[test]
    fn test_store_args_fall_back_to_config() {
        let config = ConfigFile::default();
        let args = StoreArgs {
            dir: None,
            format: Some(FormatArg::Bincode),
        };
        let (dir, format) = args.resolve(&config);
        assert_eq!(dir, config.store.directory);
        assert_eq!(format, ShardFileFormat::Bincode);
    }
}
