//! Tests for audit sink

use prometheus_cpu_sched::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use prometheus_cpu_sched::{KernelBuilder, Priority, SchedulerConfig};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(0, "A", AuditAction::Dispatch, 0, Some("first".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].seq, 0);
    assert_eq!(events[0].thread, "A");
    assert_eq!(events[0].action, AuditAction::Dispatch);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, "A", AuditAction::Spawn, 1, None));
    sink.record(build_audit_event(2, "B", AuditAction::Spawn, 1, None));
    sink.record(build_audit_event(3, "C", AuditAction::Spawn, 1, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].thread, "B"); // First one popped
    assert_eq!(events[1].thread, "C");
}

#[test]
fn test_kernel_records_thread_lifecycle_in_order() {
    let cfg = SchedulerConfig::default()
        .with_idler_period(None)
        .with_audit_capacity(64);
    let kernel = KernelBuilder::from_config(&cfg).build().unwrap();

    kernel
        .spawn_fn("solo", Priority::new(3), |_| {})
        .unwrap()
        .join()
        .unwrap();

    let log = kernel.audit_log().unwrap();
    let actions: Vec<AuditAction> = log.events().iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Spawn,
            AuditAction::Dispatch,
            AuditAction::Release,
            AuditAction::Exit
        ]
    );
    let seqs: Vec<u64> = log.events().iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    assert_eq!(log.events()[1].free_tokens, 0);
    assert_eq!(log.events()[3].free_tokens, 1);
}
