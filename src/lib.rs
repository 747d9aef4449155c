//! # Prometheus CPU Scheduler
//!
//! A user-level thread scheduler built from monitors, condition queues and a
//! pool of CPU tokens.
//!
//! Every logical thread runs on its own OS thread, but may execute
//! application code only while it holds one of a fixed number of CPU tokens.
//! Threads waiting for a token, and threads sleeping on a [`Condition`], are
//! kept in priority order (lower numbers first, FIFO among equals). A timer
//! advances a virtual clock and periodically ends the current time slice;
//! running threads give up their token at their next checkpoint so the most
//! urgent ready thread gets to run.
//!
//! ## Building blocks
//!
//! - [`Monitor`] / [`ScopedLock`]: mutual exclusion plus an interrupt mask,
//!   released on every exit path.
//! - [`Condition`]: priority wait queue bound to one monitor.
//! - [`CpuAllocator`]: token pool with `acquire`, `release` and `defer`.
//! - [`AlarmClock`]: virtual time with `wakeme_at` / `wakeme_in`.
//! - [`InterruptController`]: manual or timer-driven ticks.
//! - [`Kernel`]: the context that owns all of the above and spawns threads.
//!
//! ## Example
//!
//! ```
//! use prometheus_cpu_sched::{KernelBuilder, Monitor, Priority, SchedulerConfig};
//! use std::sync::Arc;
//!
//! let cfg = SchedulerConfig::default().with_idler_period(None);
//! let kernel = KernelBuilder::from_config(&cfg).build().unwrap();
//! let counter = Arc::new(Monitor::new(0_u32));
//!
//! let workers: Vec<_> = (0..3)
//!     .map(|i| {
//!         let counter = Arc::clone(&counter);
//!         kernel
//!             .spawn_fn(format!("worker-{i}"), Priority::new(i), move |ctx| {
//!                 for _ in 0..10 {
//!                     *counter.enter() += 1;
//!                     ctx.checkpoint();
//!                 }
//!             })
//!             .unwrap()
//!     })
//!     .collect();
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert_eq!(*counter.enter(), 30);
//! assert_eq!(kernel.cpu().free_tokens(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduler core: threads, CPU tokens, virtual time and the kernel.
pub mod core;
/// Configuration models for the kernel, timer and idler.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Queue data structures shared by the scheduler.
pub mod infra;
/// Shared utilities.
pub mod util;

/// Condition queues bound to a monitor.
pub mod condition;
/// Per-thread interrupt masks.
pub mod interrupts;
/// Monitors and their scoped locks.
pub mod monitor;
/// Counting semaphore.
pub mod semaphore;

pub use builders::KernelBuilder;
pub use condition::Condition;
pub use config::SchedulerConfig;
pub use crate::core::{
    current_thread, AlarmClock, AppResult, CpuAllocator, InterruptController, JoinHandle, Kernel,
    Runnable, SchedulerError, SchedulerReport, ThreadContext, ThreadHandle, ThreadId, ThreadState,
};
pub use infra::PriorityQueue;
pub use interrupts::InterruptSet;
pub use monitor::{Monitor, MonitorId, ScopedLock};
pub use semaphore::TokenSemaphore;
pub use util::Priority;
