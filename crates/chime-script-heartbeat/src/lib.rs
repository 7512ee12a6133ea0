// Demo script: logs a heartbeat a few times, then says goodbye.
// Exercises the timer API end to end: repeat, delay, and kill.

use chime_scripting_api as chime;

pub struct Heartbeat {
    beats: u32,
    /// Handle of the long farewell timer, killed early once enough beats
    /// have been seen. 0 when scheduling was rejected.
    farewell: u64,
    heartbeat: u64,
}

impl chime::Script for Heartbeat {
    fn new() -> Self {
        Self {
            beats: 0,
            farewell: 0,
            heartbeat: 0,
        }
    }

    fn id(&self) -> &str {
        "heartbeat"
    }

    fn name(&self) -> &str {
        "Heartbeat"
    }

    fn description(&self) -> &str {
        "Logs a heartbeat on a repeating timer, then a farewell"
    }

    fn on_load(&mut self) {
        chime::log("starting up");

        self.heartbeat = chime::repeat(5, 2.0);
        if self.heartbeat == 0 {
            chime::log("heartbeat timer was rejected");
        }

        // Fallback farewell in case the beats never complete
        self.farewell = chime::delay(60.0);
    }

    fn on_unload(&mut self) {
        chime::kill(self.heartbeat);
        chime::kill(self.farewell);
        chime::log("shutting down");
    }

    fn on_timer(&mut self, handle: u64) {
        if handle == self.heartbeat {
            self.beats += 1;
            chime::log(&format!("beat {}", self.beats));

            if self.beats == 5 {
                // All beats seen: no need for the fallback anymore
                chime::kill(self.farewell);
                chime::log("goodbye");
            }
        } else if handle == self.farewell {
            chime::log("goodbye (timed out)");
        }
    }
}

chime::register_script!(Heartbeat);
