//! CPU token allocator.
//!
//! A fixed pool of interchangeable tokens; a logical thread may execute
//! application code only while it holds one. Threads without a token wait on
//! a priority-ordered ready queue. `release` never hands a token to a
//! specific thread: it returns the token to the pool and wakes the head of
//! the queue, which then competes for it like anybody else.
//!
//! Time slicing is cooperative. The interrupt controller calls
//! [`CpuAllocator::end_time_slice`]; each running thread notices the new
//! slice at its next [`CpuAllocator::preemption_point`] and defers once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, trace};

use crate::core::audit::{AuditAction, AuditTrail};
use crate::core::registry;
use crate::core::thread::{ThreadHandle, ThreadState};
use crate::infra::PriorityQueue;
use crate::interrupts::{self, InterruptSet};
use crate::monitor::{Monitor, ScopedLock};
use crate::util::Priority;

struct CpuState {
    free: usize,
    ready: PriorityQueue<ThreadHandle>,
}

/// Point-in-time view of the allocator, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuSnapshot {
    /// Unallocated tokens.
    pub free_tokens: usize,
    /// Threads queued for a token.
    pub ready_len: usize,
    /// Thread at the head of the ready queue.
    pub ready_head: Option<String>,
}

/// Monitor-protected pool of CPU tokens plus the ready queue.
pub struct CpuAllocator {
    state: Monitor<CpuState>,
    total: usize,
    slice: AtomicU64,
    audit: AuditTrail,
}

impl CpuAllocator {
    /// Create an allocator with `tokens` CPU tokens.
    ///
    /// # Panics
    ///
    /// Panics if `tokens` is zero.
    #[must_use]
    pub fn new(tokens: usize) -> Self {
        Self::with_audit(tokens, AuditTrail::default())
    }

    pub(crate) fn with_audit(tokens: usize, audit: AuditTrail) -> Self {
        assert!(tokens > 0, "a CPU allocator needs at least one token");
        Self {
            state: Monitor::new(CpuState {
                free: tokens,
                ready: PriorityQueue::new(),
            }),
            total: tokens,
            slice: AtomicU64::new(0),
            audit,
        }
    }

    /// Obtain a token at the calling thread's own priority.
    ///
    /// # Panics
    ///
    /// Panics if called outside a logical thread or by a thread that already
    /// holds a token.
    pub fn acquire(&self) {
        let me = registry::expect_current("CpuAllocator::acquire").thread;
        let priority = me.priority();
        let mut state = self.state.enter();
        self.claim(&mut state, &me, priority);
    }

    /// Obtain a token, queueing at `priority` while none is free.
    ///
    /// # Panics
    ///
    /// Panics if called outside a logical thread or by a thread that already
    /// holds a token.
    pub fn acquire_at(&self, priority: Priority) {
        let me = registry::expect_current("CpuAllocator::acquire").thread;
        let mut state = self.state.enter();
        self.claim(&mut state, &me, priority);
    }

    /// Return the calling thread's token and wake the head of the ready
    /// queue, if any.
    ///
    /// # Panics
    ///
    /// Panics if the caller holds no token.
    pub fn release(&self) {
        let me = registry::expect_current("CpuAllocator::release").thread;
        let mut state = self.state.enter();
        me.surrender_token();
        state.free += 1;
        assert!(
            state.free <= self.total,
            "CPU token pool overflow: {} free of {}",
            state.free,
            self.total
        );
        let next = state.ready.pop();
        if let Some(next) = &next {
            next.resume();
        }
        debug!(thread = %me, free = state.free, next = ?next.as_ref().map(ToString::to_string), "released CPU token");
        self.audit.record(
            me.to_string(),
            AuditAction::Release,
            state.free,
            next.map(|next| format!("woke {next}")),
        );
    }

    /// Yield at the calling thread's own priority. See [`defer_at`](Self::defer_at).
    pub fn defer(&self) -> bool {
        let me = registry::expect_current("CpuAllocator::defer").thread;
        let priority = me.priority();
        self.defer_at(priority)
    }

    /// Let the most urgent ready thread run if it is at least as urgent as
    /// the caller at `priority`.
    ///
    /// With no contender this returns at once. Otherwise the caller joins the
    /// ready queue and the head is taken off it; if that head is the caller
    /// itself it keeps its token and nothing else changes. If another thread
    /// wins, the caller returns its token, wakes the winner and sleeps until
    /// it can claim a token again.
    ///
    /// Returns whether control was handed to another thread.
    ///
    /// # Panics
    ///
    /// Panics if the caller holds no token, whether or not anyone is ready.
    pub fn defer_at(&self, priority: Priority) -> bool {
        let me = registry::expect_current("CpuAllocator::defer").thread;
        assert!(me.holds_token(), "{me} deferred without a CPU token");
        let mut state = self.state.enter();
        if state.ready.is_empty() {
            return false;
        }

        state.ready.push(me.clone(), priority);
        let head = state
            .ready
            .pop()
            .unwrap_or_else(|| unreachable!("ready queue emptied under the monitor"));
        if head == me {
            return false;
        }

        me.surrender_token();
        state.free += 1;
        assert!(
            state.free <= self.total,
            "CPU token pool overflow: {} free of {}",
            state.free,
            self.total
        );
        head.resume();
        debug!(thread = %me, to = %head, "deferring");
        self.audit.record(
            me.to_string(),
            AuditAction::Yield,
            state.free,
            Some(format!("to {head}")),
        );

        state.unlocked(|| me.suspend());
        self.claim(&mut state, &me, priority);
        true
    }

    /// Start a new time slice. Every thread running when this is called will
    /// defer at its next preemption point.
    pub fn end_time_slice(&self) -> u64 {
        let slice = self.slice.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(slice, "time slice ended");
        slice
    }

    /// Number of time slices ended so far.
    #[must_use]
    pub fn current_slice(&self) -> u64 {
        self.slice.load(Ordering::Acquire)
    }

    /// Accept a pending time-slice preemption, if any.
    ///
    /// Does nothing while the caller has the timer interrupt masked (inside a
    /// monitor); the preemption stays pending until the next unmasked call.
    /// Returns whether the caller gave up the CPU.
    pub fn preemption_point(&self) -> bool {
        if interrupts::is_blocked(InterruptSet::TIMER) {
            return false;
        }
        let me = registry::expect_current("CpuAllocator::preemption_point").thread;
        if !me.holds_token() || !me.charge_slice(self.current_slice()) {
            return false;
        }
        trace!(thread = %me, "time slice expired");
        self.defer_at(me.priority())
    }

    /// Unallocated tokens.
    #[must_use]
    pub fn free_tokens(&self) -> usize {
        self.state.enter().free
    }

    /// Size of the token pool.
    #[must_use]
    pub const fn total_tokens(&self) -> usize {
        self.total
    }

    /// Threads queued for a token.
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.state.enter().ready.len()
    }

    /// Consistent view of the pool and the ready queue.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        let state = self.state.enter();
        CpuSnapshot {
            free_tokens: state.free,
            ready_len: state.ready.len(),
            ready_head: state.ready.front().map(ToString::to_string),
        }
    }

    fn claim(&self, state: &mut ScopedLock<'_, CpuState>, me: &ThreadHandle, priority: Priority) {
        // A holder on the ready queue would wait on itself forever.
        assert!(!me.holds_token(), "{me} acquired a second CPU token");
        while state.free == 0 {
            state.ready.push(me.clone(), priority);
            me.set_state(ThreadState::Ready);
            trace!(thread = %me, %priority, "waiting for a CPU token");
            state.unlocked(|| me.suspend());
        }
        state.free -= 1;
        me.grant_token(self.current_slice());
        debug!(thread = %me, free = state.free, "dispatched");
        self.audit
            .record(me.to_string(), AuditAction::Dispatch, state.free, None);
    }
}

impl fmt::Debug for CpuAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuAllocator")
            .field("total", &self.total)
            .field("slice", &self.current_slice())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
