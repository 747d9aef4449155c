//! Tests for utility types

use prometheus_cpu_sched::util::Priority;
use prometheus_cpu_sched::{InterruptSet, PriorityQueue, SchedulerReport, TokenSemaphore};

#[test]
fn test_priority_ordering() {
    assert!(Priority::HIGHEST < Priority::new(1));
    assert!(Priority::new(1) < Priority::new(5));
    assert!(Priority::new(5) < Priority::LOWEST);
    assert_eq!(Priority::default(), Priority::LOWEST);
}

#[test]
fn test_priority_queue_orders_by_priority_then_arrival() {
    let mut queue = PriorityQueue::new();
    queue.push("late-urgent", Priority::new(1));
    queue.push_lowest("background");
    queue.push("first-normal", Priority::new(5));
    queue.push("second-normal", Priority::new(5));

    let order: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(order, vec!["late-urgent", "first-normal", "second-normal", "background"]);
}

#[test]
fn test_token_semaphore_counts() {
    let sem = TokenSemaphore::new(2);
    assert!(sem.try_acquire());
    assert!(sem.try_acquire());
    assert!(!sem.try_acquire());
    sem.release();
    assert_eq!(sem.available(), 1);
}

#[test]
fn test_interrupt_sets() {
    assert!(InterruptSet::ALL.contains(InterruptSet::TIMER));
    assert!(!InterruptSet::empty().contains(InterruptSet::TIMER));
}

#[test]
fn test_report_format() {
    let report = SchedulerReport {
        caller: "idler".to_string(),
        free_tokens: 1,
        ready_len: 0,
        ready_head: None,
    };
    assert_eq!(report.to_string(), "idler/1/0/none");
}
