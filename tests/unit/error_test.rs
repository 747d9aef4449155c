//! Tests for error types

use std::io;

use prometheus_cpu_sched::core::{AppResult, SchedulerError};

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("cpu_tokens must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: cpu_tokens must be greater than 0"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = SchedulerError::Spawn {
        name: "worker".to_string(),
        source: io::Error::other("no threads left"),
    };
    assert_eq!(format!("{}", err), "failed to spawn thread `worker`: no threads left");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_thread_panicked_error() {
    let err = SchedulerError::ThreadPanicked("A".to_string());
    assert_eq!(format!("{}", err), "thread `A` panicked");
}

#[test]
fn test_timer_and_shutdown_errors() {
    assert_eq!(format!("{}", SchedulerError::TimerRunning), "interrupt timer already running");
    assert_eq!(format!("{}", SchedulerError::ShuttingDown), "kernel is shutting down");
}

#[test]
fn test_app_result_wraps_scheduler_error() {
    fn start() -> AppResult<()> {
        Err(SchedulerError::TimerRunning.into())
    }
    let err = start().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
