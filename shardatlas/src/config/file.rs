//! Reading and writing the config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Errors reading, validating or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Cannot parse config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Cannot write config file {}: {source}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    /// A key holds a value its setting cannot take.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Cannot create config directory {}: {source}", path.display())]
    DirectoryError { path: PathBuf, source: io::Error },
}

impl ConfigFile {
    /// Read settings from `path`, falling back to the defaults for a file
    /// that does not exist. Nothing is created on disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        match Ini::load_from_file(path) {
            Ok(ini) => super::parser::parse_ini(&ini),
            Err(ini::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the settings as a commented INI file, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigFileError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, super::writer::to_config_string(self)).map_err(|source| {
            ConfigFileError::WriteError {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// `~/.shardatlas`, or `./.shardatlas` without a home directory.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shardatlas")
}

/// `~/.shardatlas/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ZOOM;
    use crate::fetch::ShardFileFormat;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.sharding.zoom, DEFAULT_ZOOM);
        assert_eq!(config.store.format, ShardFileFormat::Json);
        assert!(!config.expansion.defer_loading);
        assert_eq!(config.expansion.max_convergence_passes, None);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.sharding.zoom = 12;
        config.store.directory = temp_dir.path().join("shards");
        config.store.format = ShardFileFormat::Bincode;
        config.expansion.defer_loading = true;
        config.expansion.aggressively_explore_relations = true;
        config.expansion.max_convergence_passes = Some(8);
        config.logging.directory = temp_dir.path().join("logs");

        config.save_to(&config_path).unwrap();
        let reloaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_config_file_path_is_under_config_directory() {
        assert!(config_file_path().starts_with(config_directory()));
        assert!(config_file_path().ends_with("config.ini"));
    }

    #[test]
    fn test_save_below_a_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = ConfigFile::default().save_to(&blocker.join("config.ini"));
        assert!(matches!(
            result,
            Err(ConfigFileError::DirectoryError { ref path, .. }) if path == &blocker
        ));
    }
}
