//! The scheduling context.
//!
//! A [`Kernel`] owns one CPU allocator, one alarm clock, one interrupt
//! controller and the registry of its live threads. It is cheap to clone;
//! every logical thread it spawns carries a clone in its [`ThreadContext`].
//!
//! Each logical thread runs on its own OS thread. The entry point binds the
//! thread's handle to that OS thread, waits for a CPU token, runs the body and
//! gives the token back on every exit path.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::core::alarm::AlarmClock;
use crate::core::audit::{AuditAction, AuditTrail, InMemoryAuditSink, SharedAuditSink};
use crate::core::cpu::CpuAllocator;
use crate::core::error::SchedulerError;
use crate::core::idler::Idler;
use crate::core::interrupt::InterruptController;
use crate::core::registry::{self, ThreadRegistry};
use crate::core::report::SchedulerReport;
use crate::core::runnable::{FnRunnable, Runnable, ThreadContext};
use crate::core::thread::{ThreadHandle, ThreadId, ThreadState};
use crate::interrupts::{self, InterruptSet};
use crate::util::Priority;

struct KernelInner {
    config: SchedulerConfig,
    cpu: Arc<CpuAllocator>,
    clock: Arc<AlarmClock>,
    interrupts: InterruptController,
    registry: ThreadRegistry,
    audit: AuditTrail,
    audit_log: Option<InMemoryAuditSink>,
    next_id: AtomicU64,
    shutdown: AtomicBool,
}

/// Shared handle to a scheduling context.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    /// Build a kernel from `config`, spawning the idler if configured.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if validation fails, or
    /// [`SchedulerError::Spawn`] if the idler cannot be started.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        crate::builders::KernelBuilder::from_config(&config).build()
    }

    pub(crate) fn assemble(
        config: SchedulerConfig,
        sink: Option<SharedAuditSink>,
        audit_log: Option<InMemoryAuditSink>,
    ) -> Self {
        let audit = AuditTrail::new(sink);
        let cpu = Arc::new(CpuAllocator::with_audit(config.cpu_tokens, audit.clone()));
        let clock = Arc::new(AlarmClock::new());
        let interrupts = InterruptController::new(
            Arc::clone(&cpu),
            Arc::clone(&clock),
            config.time_slice_ticks,
            config.max_ticks,
        );
        info!(
            cpu_tokens = config.cpu_tokens,
            time_slice_ticks = config.time_slice_ticks,
            "kernel created"
        );
        Self {
            inner: Arc::new(KernelInner {
                config,
                cpu,
                clock,
                interrupts,
                registry: ThreadRegistry::new(),
                audit,
                audit_log,
                next_id: AtomicU64::new(1),
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Configuration the kernel was built from.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// CPU token allocator.
    #[must_use]
    pub fn cpu(&self) -> &CpuAllocator {
        &self.inner.cpu
    }

    /// Virtual-time alarm clock.
    #[must_use]
    pub fn clock(&self) -> &AlarmClock {
        &self.inner.clock
    }

    /// Timer interrupt source.
    #[must_use]
    pub fn interrupts(&self) -> &InterruptController {
        &self.inner.interrupts
    }

    /// Registry of live threads.
    #[must_use]
    pub fn registry(&self) -> &ThreadRegistry {
        &self.inner.registry
    }

    /// Live threads ordered by id.
    #[must_use]
    pub fn threads(&self) -> Vec<ThreadHandle> {
        self.inner.registry.snapshot()
    }

    /// In-memory audit log, when the kernel was built with one.
    #[must_use]
    pub fn audit_log(&self) -> Option<&InMemoryAuditSink> {
        self.inner.audit_log.as_ref()
    }

    /// Spawn a logical thread running `runnable`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ShuttingDown`] after [`shutdown`](Self::shutdown)
    /// and [`SchedulerError::Spawn`] if the OS thread cannot be created.
    pub fn spawn<R: Runnable>(&self, runnable: R) -> Result<JoinHandle, SchedulerError> {
        if self.is_shutting_down() {
            return Err(SchedulerError::ShuttingDown);
        }
        let id = ThreadId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let thread = ThreadHandle::new(id, runnable.name(), runnable.priority());
        let os_name = if thread.name().is_empty() {
            format!("sched-{}", id.0)
        } else {
            thread.name().to_string()
        };

        self.inner.audit.record(
            thread.to_string(),
            AuditAction::Spawn,
            self.inner.cpu.free_tokens(),
            Some(format!("priority {}", thread.priority())),
        );

        let kernel = self.clone();
        let entry_thread = thread.clone();
        let os = thread::Builder::new()
            .name(os_name)
            .spawn(move || kernel.run_thread(&entry_thread, runnable))
            .map_err(|source| SchedulerError::Spawn {
                name: thread.to_string(),
                source,
            })?;

        info!(thread = %thread, id = %id, priority = %thread.priority(), "spawned");
        Ok(JoinHandle { thread, os })
    }

    /// Spawn a logical thread running the closure `body`.
    ///
    /// # Errors
    ///
    /// Same as [`spawn`](Self::spawn).
    pub fn spawn_fn<F>(
        &self,
        name: impl Into<String>,
        priority: Priority,
        body: F,
    ) -> Result<JoinHandle, SchedulerError>
    where
        F: FnOnce(&ThreadContext) + Send + 'static,
    {
        self.spawn(FnRunnable {
            name: name.into(),
            priority,
            body: Some(body),
        })
    }

    /// Spawn the background idler, which sleeps on the alarm clock in
    /// multiples of `period` ticks until shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] for a zero period, otherwise
    /// the same as [`spawn`](Self::spawn).
    pub fn spawn_idler(&self, period: u64) -> Result<JoinHandle, SchedulerError> {
        if period == 0 {
            return Err(SchedulerError::InvalidConfig(
                "idler_period must be greater than 0".into(),
            ));
        }
        self.spawn(Idler::new(period))
    }

    /// Deliver one timer interrupt by hand.
    pub fn tick(&self) -> u64 {
        self.inner.interrupts.tick()
    }

    /// Start the timer lane at the configured interval.
    ///
    /// # Errors
    ///
    /// See [`InterruptController::start`].
    pub fn start_timer(&self) -> Result<(), SchedulerError> {
        self.inner
            .interrupts
            .start(self.inner.config.tick_interval())
    }

    /// Diagnostic snapshot as seen from the calling thread.
    #[must_use]
    pub fn report(&self) -> SchedulerReport {
        let snapshot = self.inner.cpu.snapshot();
        SchedulerReport {
            caller: registry::current_thread().map_or_else(|| "-".to_string(), |me| me.to_string()),
            free_tokens: snapshot.free_tokens,
            ready_len: snapshot.ready_len,
            ready_head: snapshot.ready_head,
        }
    }

    /// Refuse new threads and stop the timer lane. Running threads are not
    /// interrupted; the idler exits the next time it wakes.
    ///
    /// With the timer lane stopped, a detached idler still sleeping on the
    /// clock only wakes if [`tick`](Self::tick) is called again. Until then
    /// it stays parked and keeps the kernel state alive.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("shutting down kernel");
        self.inner.interrupts.stop();
        info!(live_threads = self.inner.registry.len(), "kernel shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    fn run_thread<R: Runnable>(&self, me: &ThreadHandle, mut runnable: R) {
        let old_mask = interrupts::set(InterruptSet::ALL);
        let _bound = registry::bind(me.clone(), Arc::clone(&self.inner.cpu));
        self.inner.registry.insert(me.clone());
        interrupts::set(old_mask);

        let _exit = ExitGuard { kernel: self, me };
        debug!(thread = %me, "waiting for first CPU token");
        self.inner.cpu.acquire();
        let ctx = ThreadContext::new(me.clone(), self.clone());
        runnable.run(&ctx);
    }
}

/// Returns the token and deregisters the thread however the body exits.
struct ExitGuard<'a> {
    kernel: &'a Kernel,
    me: &'a ThreadHandle,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let inner = &self.kernel.inner;
        if self.me.holds_token() {
            inner.cpu.release();
        }
        self.me.set_state(ThreadState::Terminated);
        inner.registry.remove(self.me.id());
        inner
            .audit
            .record(self.me.to_string(), AuditAction::Exit, inner.cpu.free_tokens(), None);
        if thread::panicking() {
            error!(thread = %self.me, "thread panicked");
        } else {
            debug!(thread = %self.me, "thread exited");
        }
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.inner.config)
            .field("cpu", &self.inner.cpu)
            .field("live_threads", &self.inner.registry.len())
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}

/// Owned permission to wait for a logical thread to finish.
#[derive(Debug)]
pub struct JoinHandle {
    thread: ThreadHandle,
    os: thread::JoinHandle<()>,
}

impl JoinHandle {
    /// The spawned thread.
    #[must_use]
    pub const fn thread(&self) -> &ThreadHandle {
        &self.thread
    }

    /// Whether the thread's body has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.os.is_finished()
    }

    /// Wait for the thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ThreadPanicked`] if its body panicked.
    pub fn join(self) -> Result<(), SchedulerError> {
        self.os
            .join()
            .map_err(|_| SchedulerError::ThreadPanicked(self.thread.to_string()))
    }
}
