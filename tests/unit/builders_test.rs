//! Tests for builder modules

use prometheus_cpu_sched::builders::KernelBuilder;
use prometheus_cpu_sched::core::{InMemoryAuditSink, SchedulerError};
use prometheus_cpu_sched::SchedulerConfig;

#[test]
fn test_kernel_builder_applies_config() {
    let config = SchedulerConfig::default()
        .with_cpu_tokens(3)
        .with_time_slice_ticks(2)
        .with_idler_period(None);

    let kernel = KernelBuilder::from_config(&config).build().unwrap();
    assert_eq!(kernel.config(), &config);
    assert_eq!(kernel.cpu().total_tokens(), 3);
    assert_eq!(kernel.cpu().free_tokens(), 3);
    assert_eq!(kernel.interrupts().time_slice(), 2);
    assert!(kernel.threads().is_empty());
    assert!(kernel.audit_log().is_none());
}

#[test]
fn test_kernel_builder_rejects_invalid_config() {
    let config = SchedulerConfig::default().with_time_slice_ticks(0);
    let result = KernelBuilder::from_config(&config).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_kernel_builder_with_custom_sink() {
    let config = SchedulerConfig::default().with_idler_period(None);
    let sink = InMemoryAuditSink::new(16);
    let kernel = KernelBuilder::from_config(&config)
        .with_audit(sink.clone())
        .build()
        .unwrap();

    kernel
        .spawn_fn("t", prometheus_cpu_sched::Priority::LOWEST, |_| {})
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(sink.events().len(), 4);
}
