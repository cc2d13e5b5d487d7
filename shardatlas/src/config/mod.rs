//! Configuration file for the `shardatlas` tool.
//!
//! Settings live in `~/.shardatlas/config.ini`, one INI section per concern:
//!
//! | Section | Settings |
//! |---------|----------|
//! | `[sharding]` | tile zoom level |
//! | `[store]` | shard directory and file format |
//! | `[expansion]` | dynamic atlas policy flags |
//! | `[logging]` | log directory |
//!
//! A missing file means defaults; a present file only overrides the keys it
//! sets.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, ExpansionSettings, LoggingSettings, ShardingSettings, StoreSettings,
    DEFAULT_LOG_FILE, DEFAULT_ZOOM,
};
