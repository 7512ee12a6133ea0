use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chime_engine::ChimeConfig;
use chime_scripting_host::ScriptRunner;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory to load scripts from (overrides config)
    #[arg(short, long)]
    script_dir: Option<PathBuf>,

    /// Frame interval in milliseconds (overrides config)
    #[arg(short, long)]
    tick_ms: Option<u64>,
}

fn create_example_config() -> Result<(), Box<dyn Error>> {
    let config_path = ChimeConfig::config_path();

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let example_config = r#"# Chime Configuration

[scripting]
enabled = true
tick_interval_ms = 50

# Disable individual scripts by ID:
# [scripting.config.heartbeat]
# enabled = false
"#;

    fs::write(&config_path, example_config)?;
    info!("Created example config at {}", config_path.display());
    eprintln!("Config file created at: {}", config_path.display());
    eprintln!("Drop .wasm scripts into the script directory, then run chime again.");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting chime script host...");

    let mut config = match ChimeConfig::load() {
        Ok(cfg) => cfg,
        Err(_) => {
            info!("No config found, creating example config");
            create_example_config()?;
            return Ok(());
        }
    };

    if let Some(dir) = cli.script_dir {
        config.scripting.script_dir = Some(dir);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.scripting.tick_interval_ms = tick_ms;
    }

    if !config.scripting.enabled {
        info!("Scripting is disabled in config, nothing to do");
        return Ok(());
    }

    let tick_interval = config.scripting.tick_interval();
    let mut runner = ScriptRunner::new_with_wasm();
    runner.set_tick_interval(tick_interval);
    if !runner.has_wasm_engine() {
        return Err("WASM engine failed to initialize".into());
    }

    let script_dir = config.scripting.script_dir();
    runner.load_scripts(&script_dir, &config.scripting.config);

    if runner.script_count() == 0 {
        info!("No scripts loaded from {}", script_dir.display());
    }

    let mut frames = tokio::time::interval(tick_interval);
    loop {
        tokio::select! {
            _ = frames.tick() => {
                runner.pump(Instant::now());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    runner.unload_scripts();

    Ok(())
}
