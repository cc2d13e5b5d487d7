//! Build a dynamic atlas from a few shards and report what it pulled in.

use clap::Args;
use shardatlas::config::ConfigFile;
use shardatlas::dynamic::DynamicAtlas;

use super::common::{
    open_dynamic_atlas, print_shard_summary, ExpansionArgs, InitialShards, StoreArgs,
};
use crate::error::CliError;

/// Arguments of `shardatlas inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Initial shards as zoom-x-y
    #[arg(long = "shard", required = true, num_args = 1..)]
    pub shards: Vec<String>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub expansion: ExpansionArgs,
}

/// Feature counts after enumerating every kind.
#[derive(Debug, Default, PartialEq)]
pub struct FeatureCounts {
    pub areas: usize,
    pub lines: usize,
    pub points: usize,
    pub nodes: usize,
    pub edges: usize,
    pub relations: usize,
}

impl FeatureCounts {
    /// Enumerate every kind, expanding as needed.
    pub fn collect(atlas: &DynamicAtlas) -> Result<Self, CliError> {
        Ok(Self {
            areas: atlas.areas()?.len(),
            lines: atlas.lines()?.len(),
            points: atlas.points()?.len(),
            nodes: atlas.nodes()?.len(),
            edges: atlas.edges()?.len(),
            relations: atlas.relations()?.len(),
        })
    }
}

/// Run the inspect command.
pub fn run(args: InspectArgs, config: &ConfigFile) -> Result<(), CliError> {
    let atlas = open_dynamic_atlas(
        config,
        &args.store,
        &args.expansion,
        InitialShards::Named(&args.shards),
    )?;
    let counts = FeatureCounts::collect(&atlas)?;

    println!("Atlas: {}", atlas.name());
    if let Some(bounds) = atlas.bounds() {
        println!("  Bounds: {}", bounds);
    }
    println!();
    println!("Features");
    println!("  Areas:     {}", counts.areas);
    println!("  Lines:     {}", counts.lines);
    println!("  Points:    {}", counts.points);
    println!("  Nodes:     {}", counts.nodes);
    println!("  Edges:     {}", counts.edges);
    println!("  Relations: {}", counts.relations);
    println!();
    print_shard_summary(&atlas);
    if atlas.policy().defer_loading() && !atlas.is_preemptive_load_done() {
        println!();
        println!("Loading is deferred; pass --preload to load pending shards.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::FormatArg;
    use shardatlas::atlas::{Line, PackedAtlasBuilder, Point};
    use shardatlas::fetch::{slice_shard, write_shard, ShardFileFormat};
    use shardatlas::geometry::{Location, PolyLine};
    use shardatlas::sharding::Shard;
    use tempfile::TempDir;

    fn write_shards(dir: &std::path::Path) {
        let mut builder = PackedAtlasBuilder::new("raw");
        builder
            .add_point(Point::new(1, Location::new(10.0, -10.0)))
            .add_line(Line::new(
                2,
                PolyLine::new(vec![Location::new(20.0, -20.0), Location::new(20.0, 20.0)]),
            ));
        let raw = builder.build();
        for shard in [Shard::new(2, 1, 1).unwrap(), Shard::new(2, 2, 1).unwrap()] {
            let slice = slice_shard(&raw, &shard).unwrap();
            write_shard(dir, &shard, &slice, ShardFileFormat::Json).unwrap();
        }
    }

    fn store(dir: &std::path::Path) -> StoreArgs {
        StoreArgs {
            dir: Some(dir.to_path_buf()),
            format: Some(FormatArg::Json),
        }
    }

    #[test]
    fn test_enumeration_loads_neighbour() {
        let temp_dir = TempDir::new().unwrap();
        write_shards(temp_dir.path());

        let atlas = open_dynamic_atlas(
            &ConfigFile::default(),
            &store(temp_dir.path()),
            &ExpansionArgs::default(),
            InitialShards::Named(&["2-1-1".to_string()]),
        )
        .unwrap();
        let counts = FeatureCounts::collect(&atlas).unwrap();

        assert_eq!(counts.points, 1);
        assert_eq!(counts.lines, 1);
        assert_eq!(atlas.shards_loaded().len(), 2);
    }

    #[test]
    fn test_deferred_with_preload() {
        let temp_dir = TempDir::new().unwrap();
        write_shards(temp_dir.path());

        let expansion = ExpansionArgs {
            defer: true,
            preload: true,
            ..ExpansionArgs::default()
        };
        let atlas = open_dynamic_atlas(
            &ConfigFile::default(),
            &store(temp_dir.path()),
            &expansion,
            InitialShards::Named(&["2-1-1".to_string()]),
        )
        .unwrap();

        assert!(atlas.is_preemptive_load_done());
        assert_eq!(atlas.shards_loaded().len(), 2);
    }

    #[test]
    fn test_missing_directory_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let args = InspectArgs {
            shards: vec!["2-1-1".to_string()],
            store: store(&temp_dir.path().join("missing")),
            expansion: ExpansionArgs::default(),
        };
        assert!(matches!(
            run(args, &ConfigFile::default()),
            Err(CliError::Config(_))
        ));
    }
}
