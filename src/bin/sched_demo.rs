//! Demo driver: worker threads share a counter monitor under a live timer.
//!
//! Configuration comes from the environment (see `SchedulerConfig::from_env`),
//! e.g. `SCHED_CPU_TOKENS=2 SCHED_TICK_INTERVAL_MS=20 cargo run --bin sched_demo`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use tracing::info;

use prometheus_cpu_sched::util::init_tracing;
use prometheus_cpu_sched::{
    AppResult, KernelBuilder, Monitor, Priority, Runnable, SchedulerConfig, ThreadContext,
};

const WORKERS: u64 = 3;
const ROUNDS: u32 = 5;

/// Counter shared by every worker.
struct SharedCounter {
    value: Monitor<u64>,
}

impl SharedCounter {
    fn increment(&self) -> u64 {
        let mut value = self.value.enter();
        *value += 1;
        *value
    }
}

struct Worker {
    name: String,
    priority: Priority,
    counter: Arc<SharedCounter>,
    work: Duration,
}

impl Runnable for Worker {
    fn run(&mut self, ctx: &ThreadContext) {
        for round in 1..=ROUNDS {
            let total = self.counter.increment();
            info!(round, total, report = %ctx.kernel().report(), "counted");
            thread::sleep(self.work);
            if ctx.checkpoint() {
                info!(round, "preempted");
            }
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}

fn main() -> AppResult<()> {
    init_tracing();

    let config = SchedulerConfig::from_env().map_err(|e| anyhow!(e))?;
    info!(?config, "starting scheduler demo");
    let kernel = KernelBuilder::from_config(&config)
        .build()
        .context("building kernel")?;

    let counter = Arc::new(SharedCounter {
        value: Monitor::new(0),
    });
    let work = config.tick_interval() / 2;
    let handles = (0..WORKERS)
        .map(|i| {
            kernel.spawn(Worker {
                name: format!("worker-{i}"),
                priority: Priority::new(5 + i % 2),
                counter: Arc::clone(&counter),
                work,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    kernel.start_timer()?;

    for handle in handles {
        handle.join()?;
    }
    kernel.shutdown();

    let total = *counter.value.enter();
    info!(total, ticks = kernel.interrupts().ticks(), now = kernel.clock().now(), "demo finished");
    println!("counter = {total}");
    Ok(())
}
