//! Scheduler configuration: token pool, time slicing, timer and idler.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
