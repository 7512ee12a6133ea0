//! Script API for writing WASM scripts for chime
//!
//! This crate provides the minimal API needed to write WASM scripts.
//! Scripts should depend on this crate, not on chime-scripting-host,
//! and enable the `wasm` feature.

// Embedded WIT content for script binding generation
#[doc(hidden)]
pub const WIT_CONTENT: &str = include_str!("wit/chime-script.wit");

// Generate bindings from WIT at compile time for script use
#[cfg(feature = "wasm")]
wit_bindgen::generate!({
    path: "src/wit",
    world: "script",
    pub_export_macro: true,
    export_macro_name: "export_script",
});

// Re-export WASM script API at crate root for ergonomic imports
// This allows: use chime_scripting_api as chime; impl chime::Script for MyScript
#[cfg(feature = "wasm")]
pub use exports::chime::scripting::guest::Guest;

// Re-export host functions for WASM scripts
#[cfg(feature = "wasm")]
pub use chime::scripting::host::{delay, kill, log, repeat};

/// Trait for WASM script implementations
///
/// Implement this trait to create a script, then register it with
/// `register_script!(YourScript)`.
///
/// # Example
/// ```rust,ignore
/// use chime_scripting_api as chime;
///
/// struct MyScript {
///     // ... state
/// }
///
/// impl chime::Script for MyScript {
///     // ... implement required methods
/// }
///
/// chime::register_script!(MyScript);
/// ```
#[cfg(feature = "wasm")]
pub trait Script: Sized + 'static {
    /// Construct the script instance (called once, lazily)
    fn new() -> Self;

    /// Unique identifier for this script (e.g., "heartbeat")
    fn id(&self) -> &str;

    /// Human-readable name for this script
    fn name(&self) -> &str;

    /// Description of what this script does
    fn description(&self) -> &str;

    /// Called when the script is first loaded
    fn on_load(&mut self) {}

    /// Called when the script is being unloaded
    fn on_unload(&mut self) {}

    /// Called when a timer scheduled by this script fires.
    ///
    /// `handle` is the value returned by `delay` or `repeat` at scheduling
    /// time.
    fn on_timer(&mut self, handle: u64);
}

/// Bridge a [`Script`] implementation to the generated component exports.
///
/// The instance lives in a thread-local; WASM components are
/// single-threaded, so every guest call sees the same instance.
#[cfg(feature = "wasm")]
#[macro_export]
macro_rules! register_script {
    ($script:ty) => {
        #[doc(hidden)]
        mod __chime_script_export {
            use super::*;

            ::std::thread_local! {
                static INSTANCE: ::std::cell::RefCell<$script> =
                    ::std::cell::RefCell::new(<$script as $crate::Script>::new());
            }

            pub struct Exported;

            impl $crate::Guest for Exported {
                fn id() -> ::std::string::String {
                    INSTANCE.with(|s| $crate::Script::id(&*s.borrow()).to_string())
                }

                fn name() -> ::std::string::String {
                    INSTANCE.with(|s| $crate::Script::name(&*s.borrow()).to_string())
                }

                fn description() -> ::std::string::String {
                    INSTANCE.with(|s| $crate::Script::description(&*s.borrow()).to_string())
                }

                fn on_load() {
                    INSTANCE.with(|s| $crate::Script::on_load(&mut *s.borrow_mut()));
                }

                fn on_unload() {
                    INSTANCE.with(|s| $crate::Script::on_unload(&mut *s.borrow_mut()));
                }

                fn on_timer(handle: u64) {
                    INSTANCE.with(|s| $crate::Script::on_timer(&mut *s.borrow_mut(), handle));
                }
            }

            $crate::export_script!(Exported with_types_in $crate);
        }
    };
}
