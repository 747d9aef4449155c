//! Condition queues bound to a monitor.
//!
//! A [`Condition`] is a priority-ordered list of logical threads sleeping
//! inside one [`Monitor`]. Waiting gives up both the monitor lock and the
//! caller's CPU token; the thread comes back only after it holds a token
//! again and has re-entered the monitor, in that order. Signals are not
//! remembered: signalling a condition nobody waits on does nothing.
//!
//! # Examples
//!
//! ```
//! use prometheus_cpu_sched::{Condition, KernelBuilder, Monitor, Priority, SchedulerConfig};
//! use std::sync::Arc;
//!
//! struct Gate {
//!     open: Monitor<bool>,
//!     opened: Condition,
//! }
//!
//! let gate = Arc::new({
//!     let open = Monitor::new(false);
//!     let opened = Condition::new(&open);
//!     Gate { open, opened }
//! });
//!
//! let cfg = SchedulerConfig::default().with_idler_period(None);
//! let kernel = KernelBuilder::from_config(&cfg).build().unwrap();
//! let waiter = {
//!     let gate = Arc::clone(&gate);
//!     kernel
//!         .spawn_fn("waiter", Priority::new(5), move |_| {
//!             let mut open = gate.open.enter();
//!             while !*open {
//!                 gate.opened.wait(&mut open);
//!             }
//!         })
//!         .unwrap()
//! };
//! let opener = kernel
//!     .spawn_fn("opener", Priority::new(5), move |_| {
//!         *gate.open.enter() = true;
//!         gate.opened.signal();
//!     })
//!     .unwrap();
//!
//! opener.join().unwrap();
//! waiter.join().unwrap();
//! ```

use parking_lot::Mutex;
use tracing::trace;

use crate::core::registry;
use crate::core::thread::{ThreadHandle, ThreadState};
use crate::infra::PriorityQueue;
use crate::monitor::{Monitor, MonitorId, ScopedLock};
use crate::util::Priority;

/// Priority queue of threads sleeping inside one monitor.
#[derive(Debug)]
pub struct Condition {
    monitor: MonitorId,
    waiters: Mutex<PriorityQueue<ThreadHandle>>,
}

impl Condition {
    /// Create a condition belonging to `monitor`.
    pub fn new<T>(monitor: &Monitor<T>) -> Self {
        Self {
            monitor: monitor.id(),
            waiters: Mutex::new(PriorityQueue::new()),
        }
    }

    /// Sleep at [`Priority::LOWEST`] until signalled.
    pub fn wait<T>(&self, guard: &mut ScopedLock<'_, T>) {
        self.wait_at(guard, Priority::LOWEST);
    }

    /// Sleep until signalled; lower `priority` values are woken first.
    ///
    /// On return the caller holds a CPU token and `guard` again.
    ///
    /// # Panics
    ///
    /// Panics if `guard` belongs to a different monitor, if the caller is not
    /// a logical thread, or if it holds no CPU token. Nothing is queued or
    /// unlocked before these checks pass.
    pub fn wait_at<T>(&self, guard: &mut ScopedLock<'_, T>, priority: Priority) {
        assert_eq!(
            guard.monitor().id(),
            self.monitor,
            "condition waited on with the guard of another monitor"
        );
        let current = registry::expect_current("Condition::wait");
        let me = current.thread;
        assert!(me.holds_token(), "{me} waited on a condition without a CPU token");

        self.waiters.lock().push(me.clone(), priority);
        me.set_state(ThreadState::Blocked);
        trace!(thread = %me, %priority, "waiting on condition");

        guard.unlocked(|| {
            current.cpu.release();
            me.suspend();
            current.cpu.acquire();
        });
    }

    /// Wake the most urgent waiter, if any. Returns whether one was woken.
    pub fn signal(&self) -> bool {
        let Some(next) = self.waiters.lock().pop() else {
            return false;
        };
        trace!(thread = %next, "signalled");
        next.resume();
        true
    }

    /// Wake every waiter, most urgent first. Returns how many were woken.
    pub fn broadcast(&self) -> usize {
        let mut woken = 0;
        while self.signal() {
            woken += 1;
        }
        woken
    }

    /// Number of sleeping threads.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.waiters.lock().len()
    }

    /// Whether any thread is sleeping here.
    #[must_use]
    pub fn is_awaited(&self) -> bool {
        !self.waiters.lock().is_empty()
    }

    /// Priority of the next thread [`signal`](Self::signal) would wake.
    #[must_use]
    pub fn front_priority(&self) -> Option<Priority> {
        self.waiters.lock().front_priority()
    }
}
