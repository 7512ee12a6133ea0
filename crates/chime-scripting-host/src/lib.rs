/// Host runtime for loading and executing WASM scripts
///
/// This crate provides the runtime for embedding timer-driven WASM scripts
/// on top of the engine's frame scheduler. Scripts should depend on
/// chime-scripting-api, not this crate.
pub mod context;
pub mod script_runner;
pub mod timer;
pub mod wasm;

pub use context::ScriptContext;
pub use script_runner::ScriptRunner;
pub use timer::{TimerCallback, TimerFired, TimerHandle, TimerRegistry, TimerService};

/// Trait that scripts must implement on the host side.
pub trait Script: Send + 'static {
    /// Unique identifier for this script (e.g., "heartbeat")
    fn id(&self) -> &str;

    /// Human-readable name for this script
    fn name(&self) -> &str;

    /// Description of what this script does
    fn description(&self) -> &str;

    /// Called when the script is first loaded
    fn on_load(&mut self, ctx: &mut ScriptContext);

    /// Called when the script is being unloaded
    fn on_unload(&mut self, ctx: &mut ScriptContext);

    /// Called when a timer scheduled by this script fires
    fn on_timer(&mut self, ctx: &mut ScriptContext, handle: TimerHandle);
}
