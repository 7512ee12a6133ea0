pub(crate) mod bindings;
mod engine;
mod loader;
mod wasm_script;

pub use engine::{create_engine, create_wasi_context};
pub use loader::load_wasm_scripts;
pub use wasm_script::WasmScript;
