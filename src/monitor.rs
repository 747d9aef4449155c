//! Monitors: exclusive access to shared state plus an interrupt-masking policy.
//!
//! A [`Monitor`] composes a binary [`TokenSemaphore`] (the lock), the set of
//! interrupts to block while it is held, and the state it guards. Entering the
//! monitor returns a [`ScopedLock`], which derefs to the guarded state and, on
//! every exit path, releases the lock and then restores the caller's previous
//! interrupt mask.
//!
//! # Examples
//!
//! ```
//! use prometheus_cpu_sched::Monitor;
//!
//! struct Counter {
//!     inner: Monitor<u64>,
//! }
//!
//! impl Counter {
//!     fn increment(&self) -> u64 {
//!         let mut value = self.inner.enter();
//!         *value += 1;
//!         *value
//!     }
//! }
//!
//! let counter = Counter { inner: Monitor::new(0) };
//! counter.increment();
//! assert_eq!(counter.increment(), 2);
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};

use crate::interrupts::{self, InterruptSet};
use crate::semaphore::TokenSemaphore;

static NEXT_MONITOR_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a monitor, used to bind conditions to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(u64);

/// Mutual exclusion over `T` with an interrupt mask applied while held.
pub struct Monitor<T> {
    id: MonitorId,
    lock: TokenSemaphore,
    mask: InterruptSet,
    holder: Mutex<Option<ThreadId>>,
    // Only ever locked by the semaphore holder, so it never contends.
    data: Mutex<T>,
}

impl<T> Monitor<T> {
    /// Create a monitor guarding `data` that blocks the preemption timer
    /// while held.
    pub fn new(data: T) -> Self {
        Self::with_mask(data, InterruptSet::TIMER)
    }

    /// Create a monitor that blocks `mask` while held.
    pub fn with_mask(data: T, mask: InterruptSet) -> Self {
        Self {
            id: MonitorId(NEXT_MONITOR_ID.fetch_add(1, Ordering::Relaxed)),
            lock: TokenSemaphore::new(1),
            mask,
            holder: Mutex::new(None),
            data: Mutex::new(data),
        }
    }

    /// Identity of this monitor.
    #[must_use]
    pub const fn id(&self) -> MonitorId {
        self.id
    }

    /// Interrupts blocked while this monitor is held.
    #[must_use]
    pub const fn mask(&self) -> InterruptSet {
        self.mask
    }

    /// Enter the monitor: block its interrupt set, then take the lock.
    ///
    /// # Panics
    ///
    /// Panics if the calling OS thread already holds this monitor.
    pub fn enter(&self) -> ScopedLock<'_, T> {
        let old_mask = interrupts::block(self.mask);
        let data = self.lock_raw();
        ScopedLock {
            monitor: self,
            data: Some(data),
            old_mask,
        }
    }

    /// Whether some thread currently holds the monitor.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }

    /// Whether the calling OS thread holds the monitor.
    #[must_use]
    pub fn is_held_by_current(&self) -> bool {
        *self.holder.lock() == Some(thread::current().id())
    }

    /// Consume the monitor, returning the guarded state.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    fn lock_raw(&self) -> MutexGuard<'_, T> {
        let me = thread::current().id();
        assert!(
            *self.holder.lock() != Some(me),
            "monitor {:?} re-entered by the thread already holding it",
            self.id
        );
        self.lock.acquire();
        *self.holder.lock() = Some(me);
        self.data
            .try_lock()
            .unwrap_or_else(|| panic!("monitor {:?} state locked without the monitor lock", self.id))
    }

    fn unlock_raw(&self, data: MutexGuard<'_, T>) {
        drop(data);
        let previous = self.holder.lock().take();
        assert_eq!(
            previous,
            Some(thread::current().id()),
            "monitor {:?} released by a thread that does not hold it",
            self.id
        );
        self.lock.release();
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("id", &self.id)
            .field("mask", &self.mask)
            .field("held", &self.is_held())
            .finish_non_exhaustive()
    }
}

/// Guard returned by [`Monitor::enter`].
///
/// Dropping it releases the monitor's lock and then restores the interrupt
/// mask that was in effect before the monitor was entered.
pub struct ScopedLock<'a, T> {
    monitor: &'a Monitor<T>,
    data: Option<MutexGuard<'a, T>>,
    old_mask: InterruptSet,
}

impl<'a, T> ScopedLock<'a, T> {
    /// The monitor this guard holds.
    #[must_use]
    pub const fn monitor(&self) -> &'a Monitor<T> {
        self.monitor
    }

    /// Release the monitor's lock while `f` runs, then reacquire it.
    ///
    /// The interrupt mask is left untouched: a thread that gives up a monitor
    /// in order to sleep keeps the monitor's interrupts blocked until it
    /// returns from the guarded method. If `f` panics the lock stays released
    /// and the guard's drop only restores the mask.
    pub fn unlocked<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let data = self
            .data
            .take()
            .unwrap_or_else(|| unreachable!("scoped lock used while unlocked"));
        self.monitor.unlock_raw(data);
        let result = f();
        self.data = Some(self.monitor.lock_raw());
        result
    }
}

impl<T> Deref for ScopedLock<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.data {
            Some(ref data) => data,
            None => unreachable!("scoped lock used while unlocked"),
        }
    }
}

impl<T> DerefMut for ScopedLock<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.data {
            Some(ref mut data) => data,
            None => unreachable!("scoped lock used while unlocked"),
        }
    }
}

impl<T> Drop for ScopedLock<'_, T> {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.monitor.unlock_raw(data);
        }
        interrupts::set(self.old_mask);
    }
}

impl<T: fmt::Debug> fmt::Debug for ScopedLock<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLock")
            .field("monitor", &self.monitor.id)
            .field("data", &self.data.as_deref())
            .finish()
    }
}
