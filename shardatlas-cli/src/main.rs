//! shardatlas CLI - Command-line interface
//!
//! Tools around sharded atlases: cutting a raw atlas into shard files,
//! inspecting and querying a dynamic atlas over a shard directory, and
//! managing the configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shardatlas::config::{config_file_path, ConfigFile};
use shardatlas::logging::{default_log_file, init_logging, LoggingGuard};

use commands::config::ConfigCommands;
use commands::inspect::InspectArgs;
use commands::query::QueryArgs;
use commands::shards::ShardsArgs;
use commands::slice::SliceArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "shardatlas")]
#[command(version = shardatlas::VERSION)]
#[command(about = "Sharded map atlases with a lazily expanding view", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.shardatlas/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a raw atlas into one file per shard
    Slice(SliceArgs),

    /// Load shards into a dynamic atlas and report what it pulled in
    Inspect(InspectArgs),

    /// List features returned by spatial queries
    Query(QueryArgs),

    /// Show the shard covering a location
    Shards(ShardsArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);

    // Config commands must work even when the file is broken
    let command = match cli.command {
        Commands::Config(command) => return commands::config::run(command, &config_path),
        command => command,
    };

    let config = ConfigFile::load_from(&config_path)?;
    let _guard = start_logging(&config)?;

    match command {
        Commands::Slice(args) => commands::slice::run(args, &config),
        Commands::Inspect(args) => commands::inspect::run(args, &config),
        Commands::Query(args) => commands::query::run(args, &config),
        Commands::Shards(args) => commands::shards::run(args, &config),
        Commands::Config(_) => Ok(()),
    }
}

fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    init_logging(&config.logging.directory, default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))
}
