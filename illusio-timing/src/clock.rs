use crate::timer::Timer;
use std::time::Duration;

/// Measures reaction time from the first response-eligible frame.
///
/// The onset is latched on the first call to [`ReactionClock::mark_onset`];
/// later calls within the same trial are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactionClock {
    onset_ns: Option<u64>,
}

impl ReactionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_onset(&mut self, now_ns: u64) {
        self.onset_ns.get_or_insert(now_ns);
    }

    pub fn onset(&self) -> Option<u64> {
        self.onset_ns
    }

    pub fn reaction_time(&self, now_ns: u64) -> Duration {
        let onset = self.onset_ns.unwrap_or(now_ns);
        Duration::from_nanos(now_ns.saturating_sub(onset))
    }
}

/// Caps a display/poll cycle to a target rate, like a game-loop clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameLimiter {
    last_tick_ns: Option<u64>,
}

impl FrameLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous tick, so the next one starts a fresh frame and
    /// records nothing. Call after a deliberate pause such as a fixation delay.
    pub fn reset(&mut self) {
        self.last_tick_ns = None;
    }

    /// Sleeps for whatever is left of the current frame interval and records
    /// the full frame duration on the timer. Returns that duration.
    pub fn tick<T: Timer<Timestamp = u64>>(&mut self, timer: &mut T, target_hz: u32) -> Duration {
        let now = timer.now();
        let Some(last) = self.last_tick_ns else {
            self.last_tick_ns = Some(now);
            return Duration::ZERO;
        };

        if target_hz > 0 {
            let interval = Duration::from_nanos(1_000_000_000 / u64::from(target_hz));
            let spent = Duration::from_nanos(now.saturating_sub(last));
            if spent < interval {
                timer.sleep(interval - spent);
            }
        }

        let end = timer.now();
        let frame = Duration::from_nanos(end.saturating_sub(last));
        timer.record_frame(frame);
        self.last_tick_ns = Some(end);
        frame
    }
}
