use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use super::context::ScriptContext;
use super::timer::TimerService;
use super::wasm::WasmScript;
use super::Script;

/// Default tick rate for the frame loop (50ms = 20Hz)
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Runs scripts and routes timer firings to them
pub struct ScriptRunner {
    /// All registered WASM scripts
    scripts: Vec<WasmScript>,
    /// WASM engine (if WASM support is enabled)
    wasm_engine: Option<wasmtime::Engine>,
    /// Timer plumbing shared across all scripts
    timers: TimerService,
    /// Last time the frame loop ran
    last_tick: Instant,
    /// Interval between frames (default 50ms for 20Hz)
    tick_interval: Duration,
}

impl ScriptRunner {
    /// Create a new script runner with default tick rate (20Hz)
    pub fn new() -> Self {
        Self::new_with_tick_rate(DEFAULT_TICK_INTERVAL)
    }

    /// Create a new script runner with custom tick rate
    pub fn new_with_tick_rate(tick_interval: Duration) -> Self {
        Self {
            scripts: Vec::new(),
            wasm_engine: None,
            timers: TimerService::new(),
            last_tick: Instant::now(),
            tick_interval,
        }
    }

    /// Create a new script runner with WASM support enabled
    pub fn new_with_wasm() -> Self {
        let wasm_engine = match super::wasm::create_engine() {
            Ok(engine) => {
                debug!(target: "scripting", "WASM engine initialized");
                Some(engine)
            }
            Err(e) => {
                error!(target: "scripting", "Failed to initialize WASM engine: {:#}", e);
                None
            }
        };

        Self {
            scripts: Vec::new(),
            wasm_engine,
            timers: TimerService::new(),
            last_tick: Instant::now(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Register a WASM script
    pub fn register_script(&mut self, script: WasmScript) {
        debug!(target: "scripting", "Registering script: {} ({})", script.name(), script.id());

        let mut script = script;
        script.set_slot(self.scripts.len());

        let mut ctx = Self::create_script_context(&mut self.timers);
        script.on_load(&mut ctx);

        self.scripts.push(script);
    }

    /// Change the frame interval used by [`Self::pump`]
    pub fn set_tick_interval(&mut self, tick_interval: Duration) {
        self.tick_interval = tick_interval;
    }

    /// Get the number of registered scripts
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    /// Check if WASM engine is available
    pub fn has_wasm_engine(&self) -> bool {
        self.wasm_engine.is_some()
    }

    /// Get the IDs of all registered scripts
    pub fn script_ids(&self) -> Vec<&str> {
        self.scripts.iter().map(|s| s.id()).collect()
    }

    /// Number of currently registered timers across all scripts
    pub fn active_timer_count(&self) -> usize {
        self.timers.active_count()
    }

    /// Create a script context for the current state
    fn create_script_context(timers: &mut TimerService) -> ScriptContext {
        unsafe { ScriptContext::new(timers as *mut TimerService) }
    }

    /// Load scripts from a directory
    pub fn load_scripts(
        &mut self,
        dir: &std::path::Path,
        script_config: &HashMap<String, toml::Value>,
    ) {
        debug!(target: "scripting", "Loading scripts from {}", dir.display());

        let Some(ref engine) = self.wasm_engine else {
            tracing::warn!(target: "scripting", "Script engine not available, skipping script loading");
            return;
        };

        let scripts = super::wasm::load_wasm_scripts(engine, dir, script_config);

        for script in scripts {
            self.register_script(script);
        }

        if !self.scripts.is_empty() {
            info!(target: "scripting", "Loaded {} script(s)", self.scripts.len());
        }
    }

    /// Unload all scripts, calling their on_unload exports
    pub fn unload_scripts(&mut self) {
        let count = self.scripts.len();

        if count == 0 {
            return;
        }

        debug!(target: "scripting", "Unloading {} script(s)", count);

        let mut ctx = Self::create_script_context(&mut self.timers);

        for script in self.scripts.iter_mut() {
            debug!(target: "scripting", "Calling on_unload for: {} ({})", script.name(), script.id());
            script.on_unload(&mut ctx);
        }

        self.scripts.clear();
    }

    /// Run one frame if enough time has elapsed since the last one.
    ///
    /// Advances the scheduler by the elapsed delta, then dispatches each
    /// queued timer firing to the owning script's on_timer export. Firings
    /// of timers killed during dispatch are discarded, so a script never
    /// observes a firing after its kill call returned.
    pub fn pump(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_tick);

        if elapsed < self.tick_interval {
            return; // Not time for a frame yet
        }

        self.last_tick = now;
        self.timers.advance(elapsed);

        while let Some(fired) = self.timers.next_fired() {
            let mut ctx = Self::create_script_context(&mut self.timers);

            let Some(script) = self.scripts.get_mut(fired.script) else {
                // Owning script was unloaded; drop the firing
                continue;
            };

            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                script.on_timer(&mut ctx, fired.handle);
            })) {
                Ok(_) => {}
                Err(e) => {
                    error!(target: "scripting",
                        "Script {} ({}) panicked while handling timer: {:?}",
                        script.name(),
                        script.id(),
                        e
                    );
                }
            }
        }
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScriptRunner {
    fn drop(&mut self) {
        let mut ctx = Self::create_script_context(&mut self.timers);

        for script in &mut self.scripts {
            script.on_unload(&mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_respects_the_tick_interval() {
        let mut runner = ScriptRunner::new_with_tick_rate(Duration::from_millis(50));
        let start = runner.last_tick;

        // Too early: no frame runs, last_tick unchanged
        runner.pump(start + Duration::from_millis(10));
        assert_eq!(runner.last_tick, start);

        runner.pump(start + Duration::from_millis(60));
        assert_eq!(runner.last_tick, start + Duration::from_millis(60));
    }

    #[test]
    fn pump_without_scripts_is_harmless() {
        let mut runner = ScriptRunner::new();
        let start = runner.last_tick;
        runner.pump(start + Duration::from_millis(100));
        runner.pump(start + Duration::from_millis(200));
        assert_eq!(runner.script_count(), 0);
        assert_eq!(runner.active_timer_count(), 0);
    }
}
