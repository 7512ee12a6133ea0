use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

/// Callback invoked on each firing, with the frame delta that triggered it.
pub type SchedulerCallback = Box<dyn FnMut(Duration) + Send>;

/// One registration in the scheduler table.
///
/// The entry owns its callback for the whole registered lifetime; removing
/// the entry (exhaustion or unschedule) drops the callback exactly once.
struct Entry {
    token: u64,
    callback: SchedulerCallback,
    interval: Duration,
    /// Firings left, including the next one.
    remaining: u32,
    delay: Duration,
    awaiting_delay: bool,
    paused: bool,
    elapsed: Duration,
}

/// Per-frame timing subsystem.
///
/// Registrations are keyed by string; a token recorded at registration time
/// must match for unscheduling, so unrelated callers cannot remove each
/// other's entries. `update` advances all entries by the frame delta and
/// invokes due callbacks inline, in non-decreasing time order per entry.
pub struct FrameScheduler {
    entries: HashMap<String, Entry>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a callback under `key`.
    ///
    /// With `delay > 0` the first firing happens once `delay` has elapsed,
    /// otherwise once `interval` has elapsed. The callback fires
    /// `extra_repeats + 1` times in total, every `interval` after the first,
    /// then the entry removes itself. A zero interval fires once per update
    /// call. Scheduling under an existing key replaces that entry.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        &mut self,
        callback: SchedulerCallback,
        token: u64,
        interval: Duration,
        extra_repeats: u32,
        delay: Duration,
        paused: bool,
        key: String,
    ) {
        let entry = Entry {
            token,
            callback,
            interval,
            remaining: extra_repeats.saturating_add(1),
            delay,
            awaiting_delay: !delay.is_zero(),
            paused,
            elapsed: Duration::ZERO,
        };

        if self.entries.insert(key.clone(), entry).is_some() {
            warn!(target: "scheduler", "Replaced existing entry under key {}", key);
        }
    }

    /// Remove the entry under `key` if its token matches.
    ///
    /// Returns whether an entry was removed. Unknown keys and token
    /// mismatches are silent no-ops.
    pub fn unschedule(&mut self, key: &str, token: u64) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.token == token => {
                self.entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Whether an entry is currently registered under `key` with `token`.
    pub fn is_scheduled(&self, key: &str, token: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.token == token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance all entries by `dt`, firing due callbacks.
    ///
    /// Each due entry is taken out of the table, fired, and reinserted if
    /// firings remain. Callbacks hold no reference back into the scheduler,
    /// so a firing can never observe the table mid-mutation.
    pub fn update(&mut self, dt: Duration) {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.paused)
            .map(|(key, _)| key.clone())
            .collect();

        for key in keys {
            let Some(mut entry) = self.entries.remove(&key) else {
                continue;
            };

            entry.elapsed += dt;

            let mut fired_delay = false;
            if entry.awaiting_delay && entry.elapsed >= entry.delay {
                entry.elapsed -= entry.delay;
                entry.awaiting_delay = false;
                (entry.callback)(dt);
                entry.remaining -= 1;
                fired_delay = true;
            }

            if !entry.awaiting_delay && entry.remaining > 0 {
                if entry.interval.is_zero() {
                    // Frame-rate timer: at most one firing per update.
                    if !fired_delay {
                        (entry.callback)(dt);
                        entry.remaining -= 1;
                    }
                } else {
                    while entry.remaining > 0 && entry.elapsed >= entry.interval {
                        entry.elapsed -= entry.interval;
                        (entry.callback)(dt);
                        entry.remaining -= 1;
                    }
                }
            }

            if entry.remaining > 0 {
                self.entries.insert(key, entry);
            }
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_callback(count: &Arc<AtomicU32>) -> SchedulerCallback {
        let count = Arc::clone(count);
        Box::new(move |_dt| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fires_every_interval_until_exhausted() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            1,
            Duration::from_millis(100),
            2,
            Duration::ZERO,
            false,
            "t".to_string(),
        );

        scheduler.update(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        scheduler.update(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        scheduler.update(Duration::from_millis(100));
        scheduler.update(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_empty());

        // Further updates do nothing
        scheduler.update(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn initial_delay_defers_first_firing() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            1,
            Duration::from_millis(100),
            1,
            Duration::from_millis(250),
            false,
            "t".to_string(),
        );

        scheduler.update(Duration::from_millis(100));
        scheduler.update(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        scheduler.update(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        scheduler.update(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn one_shot_with_delay_fires_once() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            7,
            Duration::ZERO,
            0,
            Duration::from_millis(500),
            false,
            "once".to_string(),
        );

        scheduler.update(Duration::from_millis(499));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        scheduler.update(Duration::from_millis(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_empty());

        scheduler.update(Duration::from_millis(500));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_interval_fires_once_per_update() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            1,
            Duration::ZERO,
            2,
            Duration::ZERO,
            false,
            "frame".to_string(),
        );

        scheduler.update(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        scheduler.update(Duration::from_millis(16));
        scheduler.update(Duration::from_millis(16));
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn large_delta_catches_up_on_missed_intervals() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            1,
            Duration::from_millis(100),
            4,
            Duration::ZERO,
            false,
            "t".to_string(),
        );

        scheduler.update(Duration::from_millis(350));
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn paused_entry_does_not_advance() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            1,
            Duration::from_millis(50),
            0,
            Duration::ZERO,
            true,
            "paused".to_string(),
        );

        scheduler.update(Duration::from_secs(10));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn unschedule_requires_matching_token() {
        let mut scheduler = FrameScheduler::new();
        let fired = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&fired),
            42,
            Duration::from_millis(50),
            0,
            Duration::ZERO,
            false,
            "t".to_string(),
        );

        assert!(!scheduler.unschedule("t", 41));
        assert!(scheduler.is_scheduled("t", 42));

        assert!(scheduler.unschedule("t", 42));
        assert!(!scheduler.is_scheduled("t", 42));
        assert!(!scheduler.unschedule("t", 42));

        scheduler.update(Duration::from_secs(1));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rescheduling_a_key_replaces_the_entry() {
        let mut scheduler = FrameScheduler::new();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        scheduler.schedule(
            counting_callback(&first),
            1,
            Duration::from_millis(50),
            0,
            Duration::ZERO,
            false,
            "t".to_string(),
        );
        scheduler.schedule(
            counting_callback(&second),
            2,
            Duration::from_millis(50),
            0,
            Duration::ZERO,
            false,
            "t".to_string(),
        );

        assert_eq!(scheduler.len(), 1);
        scheduler.update(Duration::from_millis(50));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
