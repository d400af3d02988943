//! Game configuration read from `config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::TICKS_PER_SECOND;
use crate::error::ConfigError;

/// Environment variable that overrides the config path
pub const CONFIG_ENV: &str = "PARTY_CRAWLER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub assets_dir: PathBuf,
    pub save_dir: PathBuf,
    pub starting_map: String,
    /// Map entered by diving into deep water with water breathing
    pub underwater_map: String,
    pub ticks_per_second: u32,
    /// Fixed RNG seed; random when absent
    pub seed: Option<u64>,
    /// Serve puffin profiling data over HTTP
    pub profiler: bool,
    pub profiler_addr: String,
    pub party: Vec<RosterEntry>,
    pub starting_gold: u32,
    pub starting_food: u32,
    /// Stop a headless run after this many frames
    pub max_frames: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            save_dir: PathBuf::from("saves"),
            starting_map: "forest".to_string(),
            underwater_map: "lake_bottom".to_string(),
            ticks_per_second: TICKS_PER_SECOND,
            seed: None,
            profiler: false,
            profiler_addr: "127.0.0.1:8585".to_string(),
            party: vec![
                RosterEntry {
                    name: "Roderick".to_string(),
                    class: "knight".to_string(),
                },
                RosterEntry {
                    name: "Ilsa".to_string(),
                    class: "sorcerer".to_string(),
                },
                RosterEntry {
                    name: "Maren".to_string(),
                    class: "cleric".to_string(),
                },
                RosterEntry {
                    name: "Tobin".to_string(),
                    class: "archer".to_string(),
                },
            ],
            starting_gold: 200,
            starting_food: 5,
            max_frames: None,
        }
    }
}

impl GameConfig {
    pub fn from_yaml(source: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(source).map_err(|err| ConfigError::Parse {
            path: path.to_string(),
            details: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            details: err.to_string(),
        })?;
        Self::from_yaml(&source, &path.display().to_string())
    }

    /// Load from `$PARTY_CRAWLER_CONFIG`, else `config.yaml`. A missing
    /// default file falls back to built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load(path)
                } else {
                    log::warn!("{DEFAULT_CONFIG_PATH} not found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let config = GameConfig::from_yaml("starting_map: lake_bottom\nseed: 7\n", "inline").unwrap();
        assert_eq!(config.starting_map, "lake_bottom");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.ticks_per_second, TICKS_PER_SECOND);
        assert_eq!(config.party.len(), 4);
    }

    #[test]
    fn test_parse_error_names_path() {
        let err = GameConfig::from_yaml("party: 12", "config.yaml").unwrap_err();
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
        let config = GameConfig::load(&path).unwrap();
        assert!(!config.party.is_empty());
    }
}
