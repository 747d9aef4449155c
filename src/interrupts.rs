//! Per-thread interrupt masks.
//!
//! Each OS thread carries its own mask, the way `pthread_sigmask` scopes signal
//! blocking to a thread. Monitors block their configured set for the duration
//! of a [`ScopedLock`](crate::ScopedLock); the preemption hook only delivers a
//! pending time-slice interrupt to a thread whose mask leaves
//! [`InterruptSet::TIMER`] open.

use std::cell::Cell;

use bitflags::bitflags;

bitflags! {
    /// A set of asynchronous interrupts that can be blocked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InterruptSet: u8 {
        /// The preemption timer.
        const TIMER = 0b0000_0001;
        /// Every interrupt source; used while a thread initialises.
        const ALL = 0b1111_1111;
    }
}

thread_local! {
    static MASK: Cell<InterruptSet> = const { Cell::new(InterruptSet::empty()) };
}

/// Replace the calling thread's mask, returning the previous one.
pub fn set(mask: InterruptSet) -> InterruptSet {
    MASK.with(|cell| cell.replace(mask))
}

/// Add `mask` to the calling thread's blocked set, returning the previous mask.
///
/// Interrupts that were already blocked stay blocked.
pub fn block(mask: InterruptSet) -> InterruptSet {
    MASK.with(|cell| {
        let old = cell.get();
        cell.set(old | mask);
        old
    })
}

/// The calling thread's current mask.
#[must_use]
pub fn current() -> InterruptSet {
    MASK.with(Cell::get)
}

/// Whether every interrupt in `set` is blocked on the calling thread.
#[must_use]
pub fn is_blocked(set: InterruptSet) -> bool {
    current().contains(set)
}
