//! Timer interrupt delivery.
//!
//! Every tick advances the [`AlarmClock`]; every `time_slice`-th tick also
//! ends the current time slice on the [`CpuAllocator`]. Ticks come either from
//! [`InterruptController::tick`] (a virtual-time harness) or from a dedicated
//! timer lane started with [`InterruptController::start`].
//!
//! The lane is an ordinary OS thread, not a logical thread: it never holds a
//! CPU token and cannot be starved by the threads it preempts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::core::alarm::AlarmClock;
use crate::core::cpu::CpuAllocator;
use crate::core::error::SchedulerError;

const TIMER_THREAD_NAME: &str = "sched-timer";

struct InterruptShared {
    cpu: Arc<CpuAllocator>,
    clock: Arc<AlarmClock>,
    time_slice: u64,
    ticks: AtomicU64,
}

impl InterruptShared {
    fn deliver(&self) -> u64 {
        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let now = self.clock.tick();
        trace!(tick, now, "timer interrupt");
        if tick % self.time_slice == 0 {
            self.cpu.end_time_slice();
        }
        tick
    }
}

struct TimerLane {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Source of timer interrupts for one kernel.
pub struct InterruptController {
    shared: Arc<InterruptShared>,
    max_ticks: Option<u64>,
    timer: Mutex<Option<TimerLane>>,
}

impl InterruptController {
    /// Create a controller ending a time slice every `time_slice` ticks. The
    /// timer lane, once started, stops by itself after `max_ticks` ticks.
    ///
    /// # Panics
    ///
    /// Panics if `time_slice` is zero.
    #[must_use]
    pub fn new(
        cpu: Arc<CpuAllocator>,
        clock: Arc<AlarmClock>,
        time_slice: u64,
        max_ticks: Option<u64>,
    ) -> Self {
        assert!(time_slice > 0, "time slice must be at least one tick");
        Self {
            shared: Arc::new(InterruptShared {
                cpu,
                clock,
                time_slice,
                ticks: AtomicU64::new(0),
            }),
            max_ticks,
            timer: Mutex::new(None),
        }
    }

    /// Deliver one timer interrupt by hand. Returns the tick number.
    pub fn tick(&self) -> u64 {
        self.shared.deliver()
    }

    /// Interrupts delivered so far, by hand or by the timer lane.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Acquire)
    }

    /// Ticks per time slice.
    #[must_use]
    pub fn time_slice(&self) -> u64 {
        self.shared.time_slice
    }

    /// Start delivering an interrupt every `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::TimerRunning`] if the lane was already
    /// started, or [`SchedulerError::Spawn`] if its thread cannot be created.
    pub fn start(&self, interval: Duration) -> Result<(), SchedulerError> {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return Err(SchedulerError::TimerRunning);
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let shared = Arc::clone(&self.shared);
        let max_ticks = self.max_ticks;
        let handle = thread::Builder::new()
            .name(TIMER_THREAD_NAME.to_string())
            .spawn(move || {
                let ticker = tick(interval);
                info!(?interval, "timer lane started");
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let delivered = shared.deliver();
                            if max_ticks.is_some_and(|max| delivered >= max) {
                                warn!(ticks = delivered, "tick limit reached, stopping timer lane");
                                break;
                            }
                        }
                    }
                }
                debug!("timer lane exited");
            })
            .map_err(|source| SchedulerError::Spawn {
                name: TIMER_THREAD_NAME.to_string(),
                source,
            })?;

        *timer = Some(TimerLane { stop_tx, handle });
        Ok(())
    }

    /// Whether the timer lane is delivering interrupts.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|lane| !lane.handle.is_finished())
    }

    /// Stop the timer lane and wait for it to exit. Does nothing if it was
    /// never started.
    pub fn stop(&self) {
        let Some(lane) = self.timer.lock().take() else {
            return;
        };
        drop(lane.stop_tx);
        if lane.handle.join().is_err() {
            warn!("timer lane panicked");
        }
        info!(ticks = self.ticks(), "timer lane stopped");
    }
}

impl Drop for InterruptController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for InterruptController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptController")
            .field("ticks", &self.ticks())
            .field("time_slice", &self.shared.time_slice)
            .field("max_ticks", &self.max_ticks)
            .field("running", &self.is_running())
            .finish()
    }
}
