//! Counting semaphore.
//!
//! This is the only primitive in the crate that talks to the OS blocking
//! machinery (a `parking_lot` mutex + condition variable). Monitors, thread
//! suspension and the CPU allocator are all built on top of it.
//!
//! # Examples
//!
//! ```
//! use prometheus_cpu_sched::TokenSemaphore;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let sem = Arc::new(TokenSemaphore::new(0));
//! let sem2 = Arc::clone(&sem);
//!
//! let handle = thread::spawn(move || {
//!     sem2.acquire();
//! });
//!
//! sem.release();
//! handle.join().unwrap();
//! assert_eq!(sem.available(), 0);
//! ```

use parking_lot::{Condvar, Mutex};

/// A counting semaphore with no ordering guarantees among waiters.
///
/// Ordering (priority, FIFO) is added by the layers above; at this layer any
/// blocked acquirer may be the one woken by a `release`.
#[derive(Debug, Default)]
pub struct TokenSemaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl TokenSemaphore {
    /// Create a semaphore holding `permits` permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            count: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Block while the count is zero, then take one permit.
    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.available.wait(&mut count);
        }
        *count -= 1;
    }

    /// Take a permit if one is available without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Return one permit and wake one blocked acquirer.
    ///
    /// # Panics
    ///
    /// Panics if the permit count would overflow.
    pub fn release(&self) {
        let mut count = self.count.lock();
        *count = count
            .checked_add(1)
            .unwrap_or_else(|| panic!("semaphore permit count overflow"));
        self.available.notify_one();
    }

    /// Permits currently available. Diagnostic only: the value may be stale
    /// by the time the caller reads it.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.count.lock()
    }
}
