use std::{fs, path::PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod scripting_config;

pub use scripting_config::ScriptingConfig;

#[derive(Debug)]
pub enum ConfigLoadError {
    NotFound,
    ParseError(String),
    IoError(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::NotFound => write!(f, "Config file not found"),
            ConfigLoadError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigLoadError::IoError(msg) => write!(f, "IO error reading config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "chime")
}

/// Platform data directory for chime (scripts, script data).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    /// Scripting configuration
    #[serde(default)]
    pub scripting: ScriptingConfig,
}

impl ChimeConfig {
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigLoadError> {
        let path = Self::config_path();

        if !path.exists() {
            return Err(ConfigLoadError::NotFound);
        }

        let content =
            fs::read_to_string(&path).map_err(|e| ConfigLoadError::IoError(e.to_string()))?;
        let config =
            toml::from_str(&content).map_err(|e| ConfigLoadError::ParseError(e.to_string()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(&path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ChimeConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ChimeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.scripting.tick_interval_ms, 50);
        assert!(parsed.scripting.enabled);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: ChimeConfig = toml::from_str("[scripting]\nenabled = false\n").unwrap();
        assert!(!parsed.scripting.enabled);
        assert_eq!(parsed.scripting.tick_interval_ms, 50);
        assert!(parsed.scripting.config.is_empty());
    }
}
