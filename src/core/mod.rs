//! Scheduler core: threads, CPU tokens, virtual time and the kernel that
//! ties them together.

pub mod alarm;
pub mod audit;
pub mod cpu;
pub mod error;
pub mod idler;
pub mod interrupt;
pub mod kernel;
pub mod registry;
pub mod report;
pub mod runnable;
pub mod thread;

pub use alarm::AlarmClock;
pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, SharedAuditSink,
};
pub use cpu::{CpuAllocator, CpuSnapshot};
pub use error::{AppResult, SchedulerError};
pub use idler::Idler;
pub use interrupt::InterruptController;
pub use kernel::{JoinHandle, Kernel};
pub use registry::{current_thread, ThreadRegistry};
pub use report::SchedulerReport;
pub use runnable::{Runnable, ThreadContext};
pub use thread::{ThreadHandle, ThreadId, ThreadState};
