//! List the features spatial queries return.

use clap::{Args, ValueEnum};
use shardatlas::atlas::Tags;
use shardatlas::config::ConfigFile;
use shardatlas::dynamic::{DynamicAtlas, DynamicAtlasError, DynamicEntity};
use shardatlas::geometry::Rectangle;

use super::common::{
    open_dynamic_atlas, parse_bbox, print_shard_summary, ExpansionArgs, InitialShards, StoreArgs,
};
use crate::error::CliError;

/// Feature kind selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum KindArg {
    Area,
    Line,
    Point,
    Node,
    Edge,
    Relation,
}

impl KindArg {
    const ALL: [KindArg; 6] = [
        KindArg::Area,
        KindArg::Line,
        KindArg::Point,
        KindArg::Node,
        KindArg::Edge,
        KindArg::Relation,
    ];
}

/// Arguments of `shardatlas query`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query box as min_lat,min_lon,max_lat,max_lon
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Rectangle,

    /// Initial shards as zoom-x-y (defaults to the shards covering the box)
    #[arg(long = "shard", num_args = 1..)]
    pub shards: Vec<String>,

    /// Only list this kind of feature
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub expansion: ExpansionArgs,
}

/// Run the spatial query for one kind.
pub fn query_kind(
    atlas: &DynamicAtlas,
    kind: KindArg,
    bbox: &Rectangle,
) -> Result<Vec<DynamicEntity>, DynamicAtlasError> {
    let entities = match kind {
        KindArg::Area => atlas
            .areas_intersecting(bbox)?
            .into_iter()
            .map(DynamicEntity::Area)
            .collect(),
        KindArg::Line => atlas
            .lines_intersecting(bbox)?
            .into_iter()
            .map(DynamicEntity::Line)
            .collect(),
        KindArg::Point => atlas
            .points_within(bbox)?
            .into_iter()
            .map(DynamicEntity::Point)
            .collect(),
        KindArg::Node => atlas
            .nodes_within(bbox)?
            .into_iter()
            .map(DynamicEntity::Node)
            .collect(),
        KindArg::Edge => atlas
            .edges_intersecting(bbox)?
            .into_iter()
            .map(DynamicEntity::Edge)
            .collect(),
        KindArg::Relation => atlas
            .relations_intersecting(bbox)?
            .into_iter()
            .map(DynamicEntity::Relation)
            .collect(),
    };
    Ok(entities)
}

fn format_tags(tags: &Tags) -> String {
    tags.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the query command.
pub fn run(args: QueryArgs, config: &ConfigFile) -> Result<(), CliError> {
    let initial = if args.shards.is_empty() {
        InitialShards::Covering(&args.bbox)
    } else {
        InitialShards::Named(&args.shards)
    };
    let atlas = open_dynamic_atlas(config, &args.store, &args.expansion, initial)?;

    let kinds = match args.kind {
        Some(kind) => vec![kind],
        None => KindArg::ALL.to_vec(),
    };

    println!("Features in {}", args.bbox);
    let mut total = 0usize;
    for kind in kinds {
        for entity in query_kind(&atlas, kind, &args.bbox)? {
            let tags = entity.tags()?;
            if tags.is_empty() {
                println!("  {}", entity);
            } else {
                println!("  {} [{}]", entity, format_tags(&tags));
            }
            total += 1;
        }
    }
    println!("{} features", total);
    println!();
    print_shard_summary(&atlas);
    Ok(())
}
