use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use chime_engine::scheduler::FrameScheduler;

/// Opaque identifier for a registered timer.
///
/// Handles are process-unique and monotonically increasing; a value is never
/// reused within the lifetime of the registry that allocated it. `0` is
/// reserved as the null handle on the script ABI and never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Scheduler registration key, derived from the handle value alone.
    ///
    /// `kill` recomputes this to find the registration, so no handle-to-key
    /// table is kept anywhere.
    fn registration_key(self) -> String {
        format!("timer-{:#x}", self.0)
    }
}

/// Zero-argument payload invoked on each firing of a timer.
pub type TimerCallback = Box<dyn FnMut() + Send>;

/// Allocates timer handles and registers their callbacks with the frame
/// scheduler.
///
/// The registry holds no per-timer state of its own: the scheduler entry
/// owns the callback for the registered lifetime, and cancellation finds the
/// entry by recomputing the registration key from the handle.
pub struct TimerRegistry {
    next_id: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    fn allocate(&mut self) -> TimerHandle {
        self.next_id += 1;
        TimerHandle(self.next_id)
    }

    /// Schedule a timer that fires every `interval_seconds`, `count` times in
    /// total, then removes itself.
    ///
    /// `count` must be positive and `interval_seconds` finite and
    /// non-negative; otherwise nothing is registered and `None` is returned.
    /// `make_callback` receives the freshly allocated handle so the payload
    /// can refer to its own timer (callers that don't need it ignore the
    /// argument).
    pub fn repeat<F>(
        &mut self,
        scheduler: &mut FrameScheduler,
        count: u32,
        interval_seconds: f64,
        make_callback: F,
    ) -> Option<TimerHandle>
    where
        F: FnOnce(TimerHandle) -> TimerCallback,
    {
        if count == 0 {
            return None;
        }
        let interval = Duration::try_from_secs_f64(interval_seconds).ok()?;

        let handle = self.allocate();
        let mut payload = make_callback(handle);
        scheduler.schedule(
            Box::new(move |_dt| payload()),
            handle.raw(),
            interval,
            count - 1,
            Duration::ZERO,
            false,
            handle.registration_key(),
        );
        Some(handle)
    }

    /// Schedule a one-shot timer that fires once after `delay_seconds`.
    ///
    /// `delay_seconds` must be finite and positive; otherwise nothing is
    /// registered and `None` is returned.
    pub fn delay<F>(
        &mut self,
        scheduler: &mut FrameScheduler,
        delay_seconds: f64,
        make_callback: F,
    ) -> Option<TimerHandle>
    where
        F: FnOnce(TimerHandle) -> TimerCallback,
    {
        if !(delay_seconds > 0.0) {
            return None;
        }
        let delay = Duration::try_from_secs_f64(delay_seconds).ok()?;

        let handle = self.allocate();
        let mut payload = make_callback(handle);
        scheduler.schedule(
            Box::new(move |_dt| payload()),
            handle.raw(),
            Duration::ZERO,
            0,
            delay,
            false,
            handle.registration_key(),
        );
        Some(handle)
    }

    /// Cancel a timer.
    ///
    /// Recomputes the registration key from the handle and unschedules it.
    /// Unknown, completed, and null handles are silent no-ops. Removing the
    /// registration drops the callback payload.
    pub fn kill(&self, scheduler: &mut FrameScheduler, handle: TimerHandle) {
        scheduler.unschedule(&handle.registration_key(), handle.raw());
    }
}

impl Default for TimerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A firing queued for delivery to a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Index of the owning script in the runner.
    pub script: usize,
    pub handle: TimerHandle,
}

/// Timer plumbing shared by all scripts in a runner.
///
/// Owns the frame scheduler and the registry, and routes firings to scripts
/// through a channel: scheduler callbacks enqueue a [`TimerFired`] and the
/// runner dispatches them to each script's `on-timer` export after every
/// frame. A kill ledger guarantees that once a script has cancelled a timer,
/// firings of it already queued in the same frame are discarded instead of
/// delivered.
pub struct TimerService {
    scheduler: FrameScheduler,
    registry: TimerRegistry,
    fired_tx: UnboundedSender<TimerFired>,
    fired_rx: UnboundedReceiver<TimerFired>,
    killed_this_frame: HashSet<TimerHandle>,
}

impl TimerService {
    pub fn new() -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        Self {
            scheduler: FrameScheduler::new(),
            registry: TimerRegistry::new(),
            fired_tx,
            fired_rx,
            killed_this_frame: HashSet::new(),
        }
    }

    /// Schedule a one-shot timer on behalf of the script at `slot`.
    ///
    /// Returns the raw handle for the script ABI, `0` when rejected.
    pub fn delay_for_script(&mut self, slot: usize, seconds: f64) -> u64 {
        let tx = self.fired_tx.clone();
        self.registry
            .delay(&mut self.scheduler, seconds, move |handle| {
                Box::new(move || {
                    let _ = tx.send(TimerFired {
                        script: slot,
                        handle,
                    });
                })
            })
            .map(TimerHandle::raw)
            .unwrap_or(0)
    }

    /// Schedule a repeating timer on behalf of the script at `slot`.
    ///
    /// Returns the raw handle for the script ABI, `0` when rejected.
    pub fn repeat_for_script(&mut self, slot: usize, count: u32, interval_seconds: f64) -> u64 {
        let tx = self.fired_tx.clone();
        self.registry
            .repeat(&mut self.scheduler, count, interval_seconds, move |handle| {
                Box::new(move || {
                    let _ = tx.send(TimerFired {
                        script: slot,
                        handle,
                    });
                })
            })
            .map(TimerHandle::raw)
            .unwrap_or(0)
    }

    /// Cancel a timer on behalf of a script.
    ///
    /// Also records the handle so firings already queued this frame are not
    /// delivered after the cancellation.
    pub fn kill_for_script(&mut self, raw_handle: u64) {
        let handle = TimerHandle::from_raw(raw_handle);
        self.registry.kill(&mut self.scheduler, handle);
        self.killed_this_frame.insert(handle);
    }

    /// Advance the scheduler by one frame delta. Due firings are queued for
    /// [`Self::next_fired`].
    pub fn advance(&mut self, dt: Duration) {
        self.killed_this_frame.clear();
        self.scheduler.update(dt);
    }

    /// Pop the next queued firing, skipping timers cancelled since they
    /// fired. Returns `None` when the queue is drained.
    pub fn next_fired(&mut self) -> Option<TimerFired> {
        while let Ok(fired) = self.fired_rx.try_recv() {
            if self.killed_this_frame.contains(&fired.handle) {
                continue;
            }
            return Some(fired);
        }
        None
    }

    /// Number of currently registered timers.
    pub fn active_count(&self) -> usize {
        self.scheduler.len()
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}
