use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};
use wasmtime::Engine;

use super::WasmScript;
use crate::Script;

/// Load all scripts from a directory, filtering by config
///
/// Runs on a dedicated thread because wasmtime-wasi sets up its own runtime
/// and must not be entered from inside an async runtime context.
pub fn load_wasm_scripts(
    engine: &Engine,
    dir: &Path,
    script_config: &HashMap<String, toml::Value>,
) -> Vec<WasmScript> {
    let engine = engine.clone();
    let dir = dir.to_path_buf();
    let script_config = script_config.clone();

    let handle = std::thread::spawn(move || scan_script_dir(&engine, &dir, &script_config));

    handle.join().unwrap_or_else(|_| {
        warn!(target: "scripting", "Script loading thread panicked");
        Vec::new()
    })
}

fn scan_script_dir(
    engine: &Engine,
    dir: &Path,
    script_config: &HashMap<String, toml::Value>,
) -> Vec<WasmScript> {
    let mut scripts = Vec::new();

    if !dir.exists() {
        info!(
            target: "scripting",
            "Script directory does not exist: {} (this is fine if no scripts are being used)",
            dir.display()
        );
        return scripts;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(target: "scripting", "Failed to read script directory {}: {}", dir.display(), e);
            return scripts;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some("wasm") {
            continue;
        }

        let script = match WasmScript::from_file(engine, &path) {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "scripting", "Failed to load script {}: {:#}", path.display(), e);
                continue;
            }
        };

        if !script_enabled(script.id(), script_config) {
            info!(
                target: "scripting",
                "Skipping disabled script: {} ({})",
                script.name(),
                script.id()
            );
            continue;
        }

        info!(
            target: "scripting",
            "Loaded script: {} ({}) from {}",
            script.name(),
            script.id(),
            path.display()
        );
        scripts.push(script);
    }

    if scripts.is_empty() {
        info!(target: "scripting", "No scripts found in {}", dir.display());
    }

    scripts
}

/// A script is enabled unless its config table says otherwise
fn script_enabled(script_id: &str, script_config: &HashMap<String, toml::Value>) -> bool {
    script_config
        .get(script_id)
        .and_then(|config| config.get("enabled"))
        .and_then(|value| value.as_bool())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(id: &str, enabled: bool) -> HashMap<String, toml::Value> {
        let mut table = toml::value::Table::new();
        table.insert("enabled".to_string(), toml::Value::Boolean(enabled));
        let mut config = HashMap::new();
        config.insert(id.to_string(), toml::Value::Table(table));
        config
    }

    #[test]
    fn scripts_default_to_enabled() {
        assert!(script_enabled("anything", &HashMap::new()));
    }

    #[test]
    fn config_can_disable_a_script() {
        assert!(!script_enabled("noisy", &config_with("noisy", false)));
        assert!(script_enabled("other", &config_with("noisy", false)));
    }
}
