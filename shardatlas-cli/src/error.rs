//! CLI error type and exit handling.

use std::fmt;
use std::path::PathBuf;
use std::process;

use shardatlas::config::ConfigFileError;
use shardatlas::dynamic::DynamicAtlasError;
use shardatlas::fetch::ShardFileError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Failed to read or write a shard file
    ShardFile { path: PathBuf, error: ShardFileError },
    /// Dynamic atlas error
    Atlas(DynamicAtlasError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Atlas(DynamicAtlasError::NoData { .. }) => {
                eprintln!();
                eprintln!("None of the requested shards has data. Check that:");
                eprintln!("  1. The shard directory is right (--dir or [store] directory)");
                eprintln!("  2. The shards were written at the configured zoom");
                eprintln!("  3. The file format matches (--format or [store] format)");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Run 'shardatlas config show' to see the active settings.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::ShardFile { path, error } => {
                write!(f, "Shard file '{}': {}", path.display(), error)
            }
            CliError::Atlas(e) => write!(f, "Atlas error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ShardFile { error, .. } => Some(error),
            CliError::Atlas(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DynamicAtlasError> for CliError {
    fn from(e: DynamicAtlasError) -> Self {
        CliError::Atlas(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
