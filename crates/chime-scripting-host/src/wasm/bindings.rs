use anyhow::Result;
use wasmtime::component::Linker;

use super::wasm_script::{chime, WasmScriptState};
use crate::ScriptContext;

/// Add all host imports to the linker
pub fn add_host_imports(linker: &mut Linker<WasmScriptState>) -> Result<()> {
    // Link the host interface
    chime::scripting::host::add_to_linker(linker, |state| state)?;

    Ok(())
}

/// Get the ScriptContext from the WasmScriptState
///
/// # Safety
/// This is safe because:
/// 1. The host_context pointer is set by WasmScript before each guest call
/// 2. The ScriptContext lives in ScriptRunner which owns the WasmScript
/// 3. The pointer is cleared after each guest call
/// 4. WASM scripts cannot store the context or use it across calls
fn get_context(state: &mut WasmScriptState) -> &mut ScriptContext {
    unsafe {
        state
            .host_context
            .expect("host_context not set - this is a bug in WasmScript")
            .as_mut()
            .expect("host_context is null - this is a bug in WasmScript")
    }
}

impl chime::scripting::host::Host for WasmScriptState {
    fn log(&mut self, message: String) {
        let script_id = self.script_id.clone();
        let ctx = get_context(self);
        ctx.log(&script_id, &message);
    }

    fn delay(&mut self, seconds: f64) -> u64 {
        let slot = self.slot;
        let ctx = get_context(self);
        ctx.schedule_delay(slot, seconds)
    }

    fn repeat(&mut self, count: u32, interval_seconds: f64) -> u64 {
        let slot = self.slot;
        let ctx = get_context(self);
        ctx.schedule_repeat(slot, count, interval_seconds)
    }

    fn kill(&mut self, handle: u64) {
        let ctx = get_context(self);
        ctx.kill_timer(handle);
    }
}
