//! Cut a raw, unsharded atlas into one file per shard.

use std::path::PathBuf;

use clap::Args;
use shardatlas::atlas::Atlas;
use shardatlas::config::ConfigFile;
use shardatlas::coord::MAX_ZOOM;
use shardatlas::fetch::{read_atlas_file, slice_shard, write_shard, ShardFileFormat};
use shardatlas::sharding::{Sharding, SlippyTileSharding};
use tracing::{debug, info};

use super::common::FormatArg;
use crate::error::CliError;

/// Arguments of `shardatlas slice`.
#[derive(Debug, Args)]
pub struct SliceArgs {
    /// Raw atlas file (.json or .bin)
    #[arg(long)]
    pub input: PathBuf,

    /// Raw atlas format (detected from the extension if not specified)
    #[arg(long, value_enum)]
    pub input_format: Option<FormatArg>,

    /// Zoom level to cut shards at (defaults to [sharding] zoom)
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Output directory (defaults to [store] directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Shard file format (defaults to [store] format)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

/// Run the slice command.
pub fn run(args: SliceArgs, config: &ConfigFile) -> Result<(), CliError> {
    let zoom = args.zoom.unwrap_or(config.sharding.zoom);
    if zoom > MAX_ZOOM {
        return Err(CliError::InvalidArgument(format!(
            "zoom {} exceeds the maximum of {}",
            zoom, MAX_ZOOM
        )));
    }

    let input_format = args.input_format.map(ShardFileFormat::from).unwrap_or_else(|| {
        args.input
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ShardFileFormat::from_extension)
            .unwrap_or_default()
    });
    let output = args
        .output
        .unwrap_or_else(|| config.store.directory.clone());
    let format = args
        .format
        .map(ShardFileFormat::from)
        .unwrap_or(config.store.format);

    let raw = read_atlas_file(&args.input, input_format).map_err(|error| CliError::ShardFile {
        path: args.input.clone(),
        error,
    })?;
    let Some(bounds) = raw.bounds() else {
        return Err(CliError::InvalidArgument(format!(
            "'{}' holds no features",
            args.input.display()
        )));
    };

    println!("Slicing {} ({} features)", raw.name(), raw.number_of_entities());
    println!("  Bounds: {}", bounds);
    println!("  Zoom:   {}", zoom);
    println!("  Output: {} ({})", output.display(), format);

    let sharding = SlippyTileSharding::new(zoom);
    let candidates = sharding.shards_for_bounds(&bounds);
    let mut written = 0usize;
    for shard in &candidates {
        let Some(slice) = slice_shard(&raw, shard) else {
            debug!(shard = %shard, "Empty shard, skipped");
            continue;
        };
        let path = write_shard(&output, shard, &slice, format).map_err(|error| {
            CliError::ShardFile {
                path: output.clone(),
                error,
            }
        })?;
        debug!(shard = %shard, path = %path.display(), "Wrote shard");
        written += 1;
    }

    info!(written, candidates = candidates.len(), zoom, "Slicing complete");
    println!();
    println!(
        "Wrote {} shard files ({} empty tiles skipped)",
        written,
        candidates.len() - written
    );
    Ok(())
}
