//! Settings structs, one per `[section]` of the config file.

use std::path::PathBuf;

use crate::fetch::ShardFileFormat;

/// Default tile zoom level of shards.
pub const DEFAULT_ZOOM: u8 = 10;

/// Default log file name inside the log directory.
pub const DEFAULT_LOG_FILE: &str = "shardatlas.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub sharding: ShardingSettings,
    pub store: StoreSettings,
    pub expansion: ExpansionSettings,
    pub logging: LoggingSettings,
}

/// `[sharding]`
#[derive(Debug, Clone, PartialEq)]
pub struct ShardingSettings {
    /// Slippy tile zoom level shards are cut at
    pub zoom: u8,
}

impl Default for ShardingSettings {
    fn default() -> Self {
        Self { zoom: DEFAULT_ZOOM }
    }
}

/// `[store]`
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Directory holding one file per shard
    pub directory: PathBuf,
    pub format: ShardFileFormat,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            directory: super::config_directory().join("shards"),
            format: ShardFileFormat::Json,
        }
    }
}

/// `[expansion]`: flags of the dynamic atlas policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSettings {
    pub extend_indefinitely: bool,
    pub defer_loading: bool,
    pub aggressively_explore_relations: bool,
    /// Cap on preemptive load convergence passes, `None` for no cap
    pub max_convergence_passes: Option<usize>,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::config_directory().join("logs"),
        }
    }
}
