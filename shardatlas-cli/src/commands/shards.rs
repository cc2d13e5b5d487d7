//! Show the shard(s) covering a location.

use clap::Args;
use shardatlas::config::ConfigFile;
use shardatlas::coord::{MAX_LAT, MAX_ZOOM, MIN_LAT};
use shardatlas::geometry::Location;
use shardatlas::sharding::{Shard, Sharding, SlippyTileSharding};

use crate::error::CliError;

/// Arguments of `shardatlas shards`.
#[derive(Debug, Args)]
pub struct ShardsArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level (defaults to [sharding] zoom)
    #[arg(long)]
    pub zoom: Option<u8>,
}

/// Shards containing the location. More than one when it lies on a border.
pub fn covering_shards(lat: f64, lon: f64, zoom: u8) -> Result<Vec<Shard>, CliError> {
    if zoom > MAX_ZOOM {
        return Err(CliError::InvalidArgument(format!(
            "zoom {} exceeds the maximum of {}",
            zoom, MAX_ZOOM
        )));
    }
    if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(CliError::InvalidArgument(format!(
            "({}, {}) is outside the Web Mercator range",
            lat, lon
        )));
    }
    let sharding = SlippyTileSharding::new(zoom);
    Ok(sharding
        .shards_covering(Location::new(lat, lon))
        .into_iter()
        .collect())
}

/// Run the shards command.
pub fn run(args: ShardsArgs, config: &ConfigFile) -> Result<(), CliError> {
    let zoom = args.zoom.unwrap_or(config.sharding.zoom);
    let shards = covering_shards(args.lat, args.lon, zoom)?;
    let sharding = SlippyTileSharding::new(zoom);

    println!("Location: {}", Location::new(args.lat, args.lon));
    println!("Zoom:     {}", zoom);
    for shard in shards {
        println!();
        println!("Shard {}", shard);
        println!("  Bounds: {}", shard.bounds());
        let neighbors = sharding
            .neighbors(&shard)
            .iter()
            .map(Shard::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("  Neighbours: {}", neighbors);
    }
    Ok(())
}
