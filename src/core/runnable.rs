//! Application-facing thread bodies.

use crate::core::alarm::AlarmClock;
use crate::core::cpu::CpuAllocator;
use crate::core::kernel::Kernel;
use crate::core::thread::ThreadHandle;
use crate::util::Priority;

/// Body of a logical thread.
///
/// `run` is entered once the thread holds its first CPU token and may use
/// any monitor or condition. Its token is returned when `run` finishes,
/// whether it returns or panics.
pub trait Runnable: Send + 'static {
    /// Entry point.
    fn run(&mut self, ctx: &ThreadContext);

    /// Name shown in logs and reports; empty means "use the id".
    fn name(&self) -> String {
        String::new()
    }

    /// Priority used for the thread's own token requests.
    fn priority(&self) -> Priority {
        Priority::LOWEST
    }
}

/// Closure-backed [`Runnable`] created by [`Kernel::spawn_fn`].
pub(crate) struct FnRunnable<F> {
    pub(crate) name: String,
    pub(crate) priority: Priority,
    pub(crate) body: Option<F>,
}

impl<F> Runnable for FnRunnable<F>
where
    F: FnOnce(&ThreadContext) + Send + 'static,
{
    fn run(&mut self, ctx: &ThreadContext) {
        if let Some(body) = self.body.take() {
            body(ctx);
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}

/// What a running thread body can reach: itself and its kernel.
#[derive(Debug, Clone)]
pub struct ThreadContext {
    me: ThreadHandle,
    kernel: Kernel,
}

impl ThreadContext {
    pub(crate) const fn new(me: ThreadHandle, kernel: Kernel) -> Self {
        Self { me, kernel }
    }

    /// The running thread.
    #[must_use]
    pub const fn me(&self) -> &ThreadHandle {
        &self.me
    }

    /// The kernel that spawned the thread.
    #[must_use]
    pub const fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// The kernel's CPU allocator.
    #[must_use]
    pub fn cpu(&self) -> &CpuAllocator {
        self.kernel.cpu()
    }

    /// The kernel's alarm clock.
    #[must_use]
    pub fn clock(&self) -> &AlarmClock {
        self.kernel.clock()
    }

    /// Give up the CPU if the current time slice has ended since this
    /// thread last ran. Returns whether another thread ran in between.
    pub fn checkpoint(&self) -> bool {
        self.kernel.cpu().preemption_point()
    }

    /// Sleep until virtual time `target`.
    pub fn sleep_until(&self, target: u64) {
        self.kernel.clock().wakeme_at(target);
    }

    /// Sleep for `ticks` virtual ticks.
    pub fn sleep_for(&self, ticks: u64) {
        self.kernel.clock().wakeme_in(ticks);
    }

    /// Whether the kernel has been asked to shut down.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.kernel.is_shutting_down()
    }
}
