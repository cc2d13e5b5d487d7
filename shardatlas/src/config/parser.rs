//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [sharding] section
    if let Some(section) = ini.section(Some("sharding")) {
        if let Some(v) = section.get("zoom") {
            config.sharding.zoom = v
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|zoom| *zoom <= MAX_ZOOM)
                .ok_or_else(|| invalid("sharding", "zoom", v, "must be an integer from 0 to 18"))?;
        }
    }

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.store.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("format") {
            config.store.format = v
                .parse()
                .map_err(|_| invalid("store", "format", v, "must be 'json' or 'bincode'"))?;
        }
    }

    // [expansion] section
    if let Some(section) = ini.section(Some("expansion")) {
        if let Some(v) = section.get("extend_indefinitely") {
            config.expansion.extend_indefinitely = parse_bool(v);
        }
        if let Some(v) = section.get("defer_loading") {
            config.expansion.defer_loading = parse_bool(v);
        }
        if let Some(v) = section.get("aggressively_explore_relations") {
            config.expansion.aggressively_explore_relations = parse_bool(v);
        }
        if let Some(v) = section.get("max_convergence_passes") {
            let trimmed = v.trim();
            config.expansion.max_convergence_passes = if trimmed.is_empty() {
                None
            } else {
                let passes = trimmed.parse::<usize>().ok().filter(|p| *p > 0).ok_or_else(|| {
                    invalid(
                        "expansion",
                        "max_convergence_passes",
                        v,
                        "must be a positive integer, or empty for no limit",
                    )
                })?;
                Some(passes)
            };
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean config value.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
