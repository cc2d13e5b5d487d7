//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let max_convergence_passes = config
        .expansion
        .max_convergence_passes
        .map(|p| p.to_string())
        .unwrap_or_default();

    format!(
        r#"[sharding]
; Slippy tile zoom level shards are cut at (0-18)
zoom = {}

[store]
; Directory holding one file per shard, named zoom-x-y.<ext>
directory = {}
; Shard file format:
;   json    - human readable (.json)
;   bincode - compact binary (.bin)
format = {}

[expansion]
; Load shards for features anywhere, not only those touching the initial shards
extend_indefinitely = {}
; Only load newly discovered shards during a preemptive load
defer_loading = {}
; During a preemptive load, also load neighbours holding more members of known relations
aggressively_explore_relations = {}
; Maximum preemptive load convergence passes (empty = no limit)
max_convergence_passes = {}

[logging]
; Directory for shardatlas.log
directory = {}
"#,
        config.sharding.zoom,
        path_to_string(&config.store.directory),
        config.store.format,
        config.expansion.extend_indefinitely,
        config.expansion.defer_loading,
        config.expansion.aggressively_explore_relations,
        max_convergence_passes,
        path_to_string(&config.logging.directory),
    )
}

/// Display a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_section_is_written() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[sharding]", "[store]", "[expansion]", "[logging]"] {
            assert!(content.contains(section), "missing {section}");
        }
        assert!(content.contains("format = json"));
        assert!(content.contains("max_convergence_passes = \n"));
    }

    #[test]
    fn test_written_config_parses() {
        let ini = ini::Ini::load_from_str(&to_config_string(&ConfigFile::default())).unwrap();
        assert_eq!(
            super::super::parser::parse_ini(&ini).unwrap(),
            ConfigFile::default()
        );
    }
}
