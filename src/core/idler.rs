//! Background idler thread.

use tracing::debug;

use crate::core::runnable::{Runnable, ThreadContext};
use crate::util::Priority;

/// Thread that wakes every `period` virtual ticks and goes back to sleep,
/// so the alarm clock always has a sleeper to drive.
#[derive(Debug, Clone, Copy)]
pub struct Idler {
    period: u64,
}

impl Idler {
    /// An idler waking at every multiple of `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    #[must_use]
    pub fn new(period: u64) -> Self {
        assert!(period > 0, "idler period must be at least one tick");
        Self { period }
    }

    /// Ticks between wake-ups.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }
}

impl Default for Idler {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Runnable for Idler {
    fn run(&mut self, ctx: &ThreadContext) {
        debug!(period = self.period, "idler running");
        let mut wakeups: u64 = 0;
        while !ctx.is_shutting_down() {
            wakeups += 1;
            ctx.sleep_until(wakeups.saturating_mul(self.period));
        }
        debug!(wakeups, "idler stopped");
    }

    fn name(&self) -> String {
        "idler".to_string()
    }

    fn priority(&self) -> Priority {
        Priority::LOWEST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idler_defaults() {
        let idler = Idler::default();
        assert_eq!(idler.period(), 5);
        assert_eq!(idler.name(), "idler");
        assert!(idler.priority().is_lowest());
    }

    #[test]
    #[should_panic(expected = "at least one tick")]
    fn test_zero_period_is_fatal() {
        let _ = Idler::new(0);
    }
}
