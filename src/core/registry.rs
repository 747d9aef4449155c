//! Thread identity lookup.
//!
//! Code running "as" a logical thread finds its own [`ThreadHandle`] (and the
//! allocator it draws tokens from) through a thread-local binding installed by
//! the thread's entry point. The per-kernel [`ThreadRegistry`] lists live
//! threads for diagnostics and joins.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::cpu::CpuAllocator;
use crate::core::thread::{ThreadHandle, ThreadId, ThreadState};
use crate::monitor::Monitor;

thread_local! {
    static CURRENT: RefCell<Option<Current>> = const { RefCell::new(None) };
}

/// The logical thread bound to the calling OS thread.
#[derive(Clone)]
pub(crate) struct Current {
    pub(crate) thread: ThreadHandle,
    pub(crate) cpu: Arc<CpuAllocator>,
}

/// Unbinds the calling OS thread when dropped.
pub(crate) struct CurrentGuard {
    _private: (),
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.borrow_mut().take());
    }
}

/// Bind `thread` to the calling OS thread until the guard drops.
///
/// # Panics
///
/// Panics if the OS thread is already bound to a logical thread.
pub(crate) fn bind(thread: ThreadHandle, cpu: Arc<CpuAllocator>) -> CurrentGuard {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        assert!(
            current.is_none(),
            "OS thread is already bound to a logical thread"
        );
        *current = Some(Current { thread, cpu });
    });
    CurrentGuard { _private: () }
}

pub(crate) fn current() -> Option<Current> {
    CURRENT.with(|current| current.borrow().clone())
}

/// The binding of the calling thread; calling `op` from anything but a
/// logical thread is a contract violation.
pub(crate) fn expect_current(op: &str) -> Current {
    current().unwrap_or_else(|| panic!("{op} called outside a logical thread"))
}

/// Handle of the logical thread running on the calling OS thread, if any.
#[must_use]
pub fn current_thread() -> Option<ThreadHandle> {
    current().map(|current| current.thread)
}

/// Live threads of one kernel, keyed by id.
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: Monitor<BTreeMap<ThreadId, ThreadHandle>>,
}

impl ThreadRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, thread: ThreadHandle) {
        let previous = self.threads.enter().insert(thread.id(), thread);
        assert!(previous.is_none(), "thread id registered twice");
    }

    pub(crate) fn remove(&self, id: ThreadId) -> Option<ThreadHandle> {
        self.threads.enter().remove(&id)
    }

    /// Look up a live thread.
    #[must_use]
    pub fn get(&self, id: ThreadId) -> Option<ThreadHandle> {
        self.threads.enter().get(&id).cloned()
    }

    /// Live threads ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ThreadHandle> {
        self.threads.enter().values().cloned().collect()
    }

    /// Number of live threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.enter().len()
    }

    /// Whether no thread is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.enter().is_empty()
    }

    /// Number of live threads in `state`.
    #[must_use]
    pub fn count_in(&self, state: ThreadState) -> usize {
        self.threads
            .enter()
            .values()
            .filter(|thread| thread.state() == state)
            .count()
    }
}
