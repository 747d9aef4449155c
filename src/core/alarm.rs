//! Virtual-time alarm clock.
//!
//! Sleepers wait on a single [`Condition`] using their wake-up time as the
//! wait priority, so the earliest deadline is always woken first. Only the
//! earliest deadline is armed; each sleeper that wakes disarms it and passes
//! the signal on so the next sleeper can re-arm its own deadline.

use std::fmt;

use tracing::trace;

use crate::condition::Condition;
use crate::monitor::{Monitor, ScopedLock};
use crate::util::Priority;

struct ClockState {
    now: u64,
    /// Earliest armed deadline; `None` means no alarm.
    next_alarm: Option<u64>,
}

/// Monitor holding the virtual time and the sleepers waiting on it.
pub struct AlarmClock {
    state: Monitor<ClockState>,
    wakeup: Condition,
}

impl AlarmClock {
    /// A clock at time zero with no alarm armed.
    #[must_use]
    pub fn new() -> Self {
        let state = Monitor::new(ClockState {
            now: 0,
            next_alarm: None,
        });
        let wakeup = Condition::new(&state);
        Self { state, wakeup }
    }

    /// Advance virtual time by one and wake the earliest sleeper if its
    /// deadline has been reached. Returns the new time.
    pub fn tick(&self) -> u64 {
        let mut state = self.state.enter();
        state.now += 1;
        let now = state.now;
        if state.next_alarm.is_some_and(|alarm| now >= alarm) {
            trace!(now, "alarm due");
            self.wakeup.signal();
        }
        now
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.state.enter().now
    }

    /// Earliest armed deadline.
    #[must_use]
    pub fn next_alarm(&self) -> Option<u64> {
        self.state.enter().next_alarm
    }

    /// Number of threads sleeping on the clock.
    #[must_use]
    pub fn sleepers(&self) -> usize {
        self.wakeup.waiting_count()
    }

    /// Sleep until virtual time `target`. Returns at once if it has passed.
    pub fn wakeme_at(&self, target: u64) {
        let state = self.state.enter();
        self.sleep_locked(state, target);
    }

    /// Sleep for `delta` ticks from now.
    pub fn wakeme_in(&self, delta: u64) {
        let state = self.state.enter();
        let target = state.now.saturating_add(delta);
        self.sleep_locked(state, target);
    }

    fn sleep_locked(&self, mut state: ScopedLock<'_, ClockState>, target: u64) {
        if state.now >= target {
            return;
        }
        while state.now < target {
            state.next_alarm = Some(state.next_alarm.map_or(target, |alarm| alarm.min(target)));
            self.wakeup.wait_at(&mut state, Priority::new(target));
        }
        trace!(now = state.now, target, "woke on alarm");
        state.next_alarm = None;
        self.wakeup.signal();
    }
}

impl Default for AlarmClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AlarmClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.enter();
        f.debug_struct("AlarmClock")
            .field("now", &state.now)
            .field("next_alarm", &state.next_alarm)
            .field("sleepers", &self.wakeup.waiting_count())
            .finish()
    }
}
