//! Logical threads.
//!
//! A [`ThreadHandle`] is the scheduler's view of one logical thread: its
//! identity, priority and lifecycle state, plus the private semaphore used to
//! suspend and resume it. Queues hold clones of the handle; the OS thread that
//! runs the body owns the thread's lifetime.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::semaphore::TokenSemaphore;
use crate::util::Priority;

/// Dense identifier of a logical thread, unique within its kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub u64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a logical thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadState {
    /// Constructed; its entry point has not asked for a token yet.
    Created,
    /// Waiting on the ready queue for a CPU token.
    Ready,
    /// Holding a CPU token.
    Running,
    /// Sleeping on a condition.
    Blocked,
    /// Entry point returned.
    Terminated,
}

struct ThreadInner {
    id: ThreadId,
    name: String,
    priority: Priority,
    state: Mutex<ThreadState>,
    holds_token: AtomicBool,
    /// Last time slice this thread has been charged for.
    slice_seen: AtomicU64,
    go: TokenSemaphore,
}

/// Shared handle to a logical thread.
///
/// Handles compare equal when they refer to the same thread.
#[derive(Clone)]
pub struct ThreadHandle {
    inner: Arc<ThreadInner>,
}

impl ThreadHandle {
    pub(crate) fn new(id: ThreadId, name: impl Into<String>, priority: Priority) -> Self {
        Self {
            inner: Arc::new(ThreadInner {
                id,
                name: name.into(),
                priority,
                state: Mutex::new(ThreadState::Created),
                holds_token: AtomicBool::new(false),
                slice_seen: AtomicU64::new(0),
                go: TokenSemaphore::new(0),
            }),
        }
    }

    /// Identifier of the thread.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.inner.id
    }

    /// Human-readable name; may be empty.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Priority used when the thread does not pass one explicitly.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.inner.priority
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ThreadState {
        *self.inner.state.lock()
    }

    /// Whether the thread currently holds a CPU token.
    #[must_use]
    pub fn holds_token(&self) -> bool {
        self.inner.holds_token.load(Ordering::Acquire)
    }

    pub(crate) fn set_state(&self, state: ThreadState) {
        *self.inner.state.lock() = state;
    }

    pub(crate) fn grant_token(&self, slice: u64) {
        let had = self.inner.holds_token.swap(true, Ordering::AcqRel);
        assert!(!had, "thread {} granted a second CPU token", self);
        self.inner.slice_seen.store(slice, Ordering::Release);
        self.set_state(ThreadState::Running);
    }

    pub(crate) fn surrender_token(&self) {
        let had = self.inner.holds_token.swap(false, Ordering::AcqRel);
        assert!(had, "thread {} gave up a CPU token it does not hold", self);
        let mut state = self.inner.state.lock();
        if *state == ThreadState::Running {
            *state = ThreadState::Ready;
        }
    }

    /// Record `slice` as charged; returns whether it was newer than the last.
    pub(crate) fn charge_slice(&self, slice: u64) -> bool {
        self.inner.slice_seen.fetch_max(slice, Ordering::AcqRel) < slice
    }

    /// Block the calling OS thread until [`resume`](Self::resume) is called.
    /// A resume that arrives first is remembered.
    pub(crate) fn suspend(&self) {
        trace!(thread = %self, "suspending");
        self.inner.go.acquire();
        trace!(thread = %self, "unsuspended");
    }

    pub(crate) fn resume(&self) {
        trace!(thread = %self, "resuming");
        self.inner.go.release();
    }
}

impl PartialEq for ThreadHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ThreadHandle {}

impl fmt::Display for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.name.is_empty() {
            write!(f, "{}", self.inner.id)
        } else {
            f.write_str(&self.inner.name)
        }
    }
}

impl fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("priority", &self.inner.priority)
            .field("state", &self.state())
            .finish()
    }
}
