//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use prometheus_cpu_sched::{Kernel, KernelBuilder, SchedulerConfig};

/// Ordered record of what the test threads did.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn push(log: &Log, entry: impl Into<String>) {
    log.lock().push(entry.into());
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// Kernel without idler or timer, driven by manual ticks.
pub fn manual_kernel(tokens: usize, time_slice_ticks: u64) -> Kernel {
    let cfg = SchedulerConfig::default()
        .with_cpu_tokens(tokens)
        .with_time_slice_ticks(time_slice_ticks)
        .with_idler_period(None)
        .with_audit_capacity(1024);
    KernelBuilder::from_config(&cfg)
        .build()
        .expect("test kernel config is valid")
}

/// Poll `cond` until it holds, failing the test after a few seconds.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}
