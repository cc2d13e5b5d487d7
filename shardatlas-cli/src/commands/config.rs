//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show`.

use std::path::Path;

use clap::Subcommand;
use shardatlas::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Show the active configuration settings
    Show,
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(path, force),
        ConfigCommands::Path => run_path(path),
        ConfigCommands::Show => run_show(path),
    }
}

/// Write the default configuration.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!("Configuration already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }
    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

/// List all configuration settings.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "(defaults, no file)".to_string()
    };

    println!("Configuration Settings");
    println!("======================");
    println!("Source: {}", source);
    println!();
    println!("[sharding]");
    println!("  zoom = {}", config.sharding.zoom);
    println!();
    println!("[store]");
    println!("  directory = {}", config.store.directory.display());
    println!("  format = {}", config.store.format);
    println!();
    println!("[expansion]");
    println!("  extend_indefinitely = {}", config.expansion.extend_indefinitely);
    println!("  defer_loading = {}", config.expansion.defer_loading);
    println!(
        "  aggressively_explore_relations = {}",
        config.expansion.aggressively_explore_relations
    );
    match config.expansion.max_convergence_passes {
        Some(passes) => println!("  max_convergence_passes = {}", passes),
        None => println!("  max_convergence_passes = (not set)"),
    }
    println!();
    println!("[logging]");
    println!("  directory = {}", config.logging.directory.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_defaults_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        run(ConfigCommands::Init { force: false }, &path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());

        std::fs::write(&path, "[sharding]\nzoom = 4\n").unwrap();
        run(ConfigCommands::Init { force: false }, &path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().sharding.zoom, 4);

        run(ConfigCommands::Init { force: true }, &path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_show_reports_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, "[store]\nformat = xml\n").unwrap();

        assert!(matches!(
            run(ConfigCommands::Show, &path),
            Err(CliError::Config(_))
        ));
    }
}
