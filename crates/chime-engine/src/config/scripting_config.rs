use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptingConfig {
    /// Whether scripting is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Directory containing scripts (default: platform data dir, `scripts/`)
    #[serde(default)]
    pub script_dir: Option<PathBuf>,

    /// Interval between scheduler frames in milliseconds (default: 50ms)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Per-script configuration (script ID -> config values)
    #[serde(default)]
    pub config: HashMap<String, toml::Value>,
}

fn default_tick_interval() -> u64 {
    50
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_dir: None,
            tick_interval_ms: default_tick_interval(),
            config: HashMap::new(),
        }
    }
}

impl ScriptingConfig {
    /// Get the script directory path (use provided or default)
    pub fn script_dir(&self) -> PathBuf {
        self.script_dir.clone().unwrap_or_else(|| {
            super::data_dir()
                .map(|p| p.join("scripts"))
                .unwrap_or_else(|| PathBuf::from(".scripts"))
        })
    }

    /// Frame interval, clamped to at least 1ms
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
