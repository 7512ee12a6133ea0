use std::path::Path;

use anyhow::{Context, Result};
use tracing::error;
use wasmtime::component::{Component, Linker};
use wasmtime::{Engine, Store};
use wasmtime_wasi::{ResourceTable, WasiCtx, WasiView};

use crate::context::ScriptContext;
use crate::timer::TimerHandle;

wasmtime::component::bindgen!({
    path: "src/wit",
    world: "script",
});

/// Store data for one script instance.
pub struct WasmScriptState {
    wasi: WasiCtx,
    table: ResourceTable,
    /// Identifier of the script, for log attribution
    pub(crate) script_id: String,
    /// Index of the script in the runner, for timer attribution
    pub(crate) slot: usize,
    /// Host context for the guest call currently in progress, if any
    pub(crate) host_context: Option<*mut ScriptContext>,
}

// The context pointer is only set around a guest call made from the thread
// that owns the store, and cleared before that call returns.
unsafe impl Send for WasmScriptState {}

impl WasiView for WasmScriptState {
    fn table(&mut self) -> &mut ResourceTable {
        &mut self.table
    }

    fn ctx(&mut self) -> &mut WasiCtx {
        &mut self.wasi
    }
}

/// A loaded WASM script component.
pub struct WasmScript {
    store: Store<WasmScriptState>,
    bindings: Script,
    id: String,
    name: String,
    description: String,
}

impl WasmScript {
    /// Load and instantiate a script component from a `.wasm` file.
    ///
    /// The component's identity exports (`id`, `name`, `description`) are
    /// called once here so failures surface at load time.
    pub fn from_file(engine: &Engine, path: &Path) -> Result<Self> {
        let component = Component::from_file(engine, path)
            .with_context(|| format!("Failed to load component from {}", path.display()))?;

        let mut linker = Linker::new(engine);
        wasmtime_wasi::add_to_linker_sync(&mut linker).context("Failed to link WASI imports")?;
        super::bindings::add_host_imports(&mut linker).context("Failed to link host imports")?;

        let state = WasmScriptState {
            wasi: super::engine::create_wasi_context()?,
            table: ResourceTable::new(),
            script_id: String::new(),
            slot: 0,
            host_context: None,
        };
        let mut store = Store::new(engine, state);

        let bindings = Script::instantiate(&mut store, &component, &linker)
            .context("Failed to instantiate script component")?;

        let guest = bindings.chime_scripting_guest();
        let id = guest.call_id(&mut store).context("Script id() failed")?;
        let name = guest.call_name(&mut store).context("Script name() failed")?;
        let description = guest
            .call_description(&mut store)
            .context("Script description() failed")?;
        store.data_mut().script_id = id.clone();

        Ok(Self {
            store,
            bindings,
            id,
            name,
            description,
        })
    }

    pub(crate) fn set_slot(&mut self, slot: usize) {
        self.store.data_mut().slot = slot;
    }

    fn enter(&mut self, ctx: &mut ScriptContext) {
        self.store.data_mut().host_context = Some(ctx as *mut ScriptContext);
    }

    fn exit(&mut self) {
        self.store.data_mut().host_context = None;
    }
}

impl crate::Script for WasmScript {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn on_load(&mut self, ctx: &mut ScriptContext) {
        self.enter(ctx);
        let result = self
            .bindings
            .chime_scripting_guest()
            .call_on_load(&mut self.store);
        self.exit();
        if let Err(e) = result {
            error!(target: "scripting", "Script {} on_load failed: {:#}", self.id, e);
        }
    }

    fn on_unload(&mut self, ctx: &mut ScriptContext) {
        self.enter(ctx);
        let result = self
            .bindings
            .chime_scripting_guest()
            .call_on_unload(&mut self.store);
        self.exit();
        if let Err(e) = result {
            error!(target: "scripting", "Script {} on_unload failed: {:#}", self.id, e);
        }
    }

    fn on_timer(&mut self, ctx: &mut ScriptContext, handle: TimerHandle) {
        self.enter(ctx);
        let result = self
            .bindings
            .chime_scripting_guest()
            .call_on_timer(&mut self.store, handle.raw());
        self.exit();
        if let Err(e) = result {
            error!(target: "scripting", "Script {} on_timer failed: {:#}", self.id, e);
        }
    }
}
