/// Engine-side collaborators for chime: the per-frame scheduler that timer
/// registrations are delegated to, and workspace configuration.
pub mod config;
pub mod scheduler;

pub use config::{ChimeConfig, ConfigLoadError, ScriptingConfig};
pub use scheduler::{FrameScheduler, SchedulerCallback};
