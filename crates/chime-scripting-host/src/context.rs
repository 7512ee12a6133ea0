use tracing::info;

use super::timer::TimerService;

/// Context provided to scripts for interacting with the host.
///
/// Host functions invoked by a script during a VM call go through this
/// context; it is created by the runner around each batch of script calls.
pub struct ScriptContext {
    /// Timer plumbing owned by the runner (will be updated by ScriptRunner)
    timers: *mut TimerService,
}

impl ScriptContext {
    /// Create a new script context
    ///
    /// # Safety
    /// The timers pointer must remain valid for the lifetime of this context
    pub(crate) unsafe fn new(timers: *mut TimerService) -> Self {
        Self { timers }
    }

    // ===== Timer Methods =====

    /// Schedule a one-shot timer for the script at `slot`. Returns the raw
    /// handle, `0` when the request was rejected.
    pub fn schedule_delay(&mut self, slot: usize, seconds: f64) -> u64 {
        unsafe { (*self.timers).delay_for_script(slot, seconds) }
    }

    /// Schedule a repeating timer for the script at `slot`. Returns the raw
    /// handle, `0` when the request was rejected.
    pub fn schedule_repeat(&mut self, slot: usize, count: u32, interval_seconds: f64) -> u64 {
        unsafe { (*self.timers).repeat_for_script(slot, count, interval_seconds) }
    }

    /// Cancel a script timer. Unknown or null handles are ignored.
    pub fn kill_timer(&mut self, raw_handle: u64) {
        unsafe { (*self.timers).kill_for_script(raw_handle) }
    }

    // ===== Logging =====

    /// Write a script-attributed line to the host log.
    pub fn log(&self, script_id: &str, message: &str) {
        info!(target: "script", "[{}] {}", script_id, message);
    }
}
