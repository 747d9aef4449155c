//! Benchmarks for the scheduler's building blocks.
//!
//! Benchmarks cover:
//! - Priority queue operations (push/pop, mixed priorities)
//! - Token semaphore and monitor entry on the uncontended path
//! - End-to-end spawning of logical threads through a kernel

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use prometheus_cpu_sched::{
    KernelBuilder, Monitor, Priority, PriorityQueue, SchedulerConfig, TokenSemaphore,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn random_priorities(count: u64, seed: u64) -> Vec<Priority> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Priority::new(rng.random_range(0..10)))
        .collect()
}

fn quiet_config(tokens: usize) -> SchedulerConfig {
    SchedulerConfig::default()
        .with_cpu_tokens(tokens)
        .with_idler_period(None)
}

// ============================================================================
// Priority Queue Benchmarks
// ============================================================================

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue_push_pop");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = PriorityQueue::new();
                for i in 0..size {
                    queue.push(i, Priority::new(5));
                }
                while let Some(item) = queue.pop() {
                    black_box(item);
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_mixed_priorities(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue_mixed");

    for size in [100_u64, 1_000, 10_000] {
        let priorities = random_priorities(size, 42);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &priorities,
            |b, priorities| {
                b.iter(|| {
                    let mut queue = PriorityQueue::new();
                    for (i, priority) in priorities.iter().enumerate() {
                        queue.push(i, *priority);
                    }
                    let mut last = Priority::HIGHEST;
                    while let Some(next) = queue.front_priority() {
                        assert!(next >= last);
                        last = next;
                        black_box(queue.pop());
                    }
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Synchronization Primitive Benchmarks
// ============================================================================

fn bench_semaphore_uncontended(c: &mut Criterion) {
    let sem = TokenSemaphore::new(1);
    c.bench_function("token_semaphore_acquire_release", |b| {
        b.iter(|| {
            sem.acquire();
            sem.release();
        });
    });
}

fn bench_monitor_enter(c: &mut Criterion) {
    let monitor = Monitor::new(0_u64);
    c.bench_function("monitor_enter_increment", |b| {
        b.iter(|| {
            let mut value = monitor.enter();
            *value += 1;
            black_box(*value);
        });
    });
}

// ============================================================================
// Kernel Benchmarks
// ============================================================================

fn bench_kernel_spawn_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_spawn_join");
    group.measurement_time(Duration::from_secs(10));

    for threads in [1_u64, 8, 32] {
        group.throughput(Throughput::Elements(threads));
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            &threads,
            |b, &threads| {
                let kernel = KernelBuilder::from_config(&quiet_config(2))
                    .build()
                    .expect("valid config");
                b.iter(|| {
                    let counter = Arc::new(Monitor::new(0_u64));
                    let handles: Vec<_> = (0..threads)
                        .map(|i| {
                            let counter = Arc::clone(&counter);
                            kernel
                                .spawn_fn(format!("bench-{i}"), Priority::new(i % 4), move |ctx| {
                                    *counter.enter() += 1;
                                    ctx.checkpoint();
                                })
                                .expect("spawn")
                        })
                        .collect();
                    for handle in handles {
                        handle.join().expect("join");
                    }
                    assert_eq!(*counter.enter(), threads);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    queue_benches,
    bench_queue_push_pop,
    bench_queue_mixed_priorities
);
criterion_group!(
    primitive_benches,
    bench_semaphore_uncontended,
    bench_monitor_enter
);
criterion_group!(kernel_benches, bench_kernel_spawn_join);
criterion_main!(queue_benches, primitive_benches, kernel_benches);
