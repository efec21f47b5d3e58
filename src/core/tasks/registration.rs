// src/core/tasks/registration.rs

//! The automatic-task table: an explicit `{name, period_seconds, handler}`
//! registered at startup. The component loop interleaves RPC serve and
//! `now >= next_due` handlers, taking the component mutex for each.
//!
//! Grounded on `Component.do_tasks()`'s approach, which walks a list
//! of `(function, period, name)` triples and calls those whose `last_run +
//! period <= now`, logging and swallowing exceptions from individual tasks
//! so one misbehaving task never stops the others.

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info};

type TaskFuture = BoxFuture<'static, anyhow::Result<()>>;

struct AutomaticTask {
    name: String,
    period: Duration,
    next_due: Instant,
    handler: Arc<dyn Fn() -> TaskFuture + Send + Sync>,
    /// Failure-mode bookkeeping: log once on entering a failing streak,
    /// once on leaving it.
    currently_failing: bool,
}

/// The set of periodic tasks a component runs, invoked cooperatively from
/// the same loop that serves RPCs.
pub struct AutomaticTaskTable {
    tasks: Mutex<Vec<AutomaticTask>>,
}

impl Default for AutomaticTaskTable {
    fn default() -> Self {
        Self { tasks: Mutex::new(Vec::new()) }
    }
}

impl AutomaticTaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a periodic task. `period` is how often it should run;
    /// `handler` is invoked with no arguments and is expected to acquire
    /// whatever component state lock it needs internally.
    pub async fn register<F, Fut>(&self, name: impl Into<String>, period: Duration, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        tasks.push(AutomaticTask {
            name: name.into(),
            period,
            next_due: Instant::now(),
            handler: Arc::new(move || Box::pin(handler())),
            currently_failing: false,
        });
    }

    /// Runs every task whose `next_due` has passed, in registration order.
    /// Called from the component's main loop on a short tick (≈1 s), much
    /// finer than any individual task's period, so tasks fire close to on
    /// schedule without busy-waiting.
    pub async fn run_due(&self) {
        let mut tasks = self.tasks.lock().await;
        let now = Instant::now();
        for task in tasks.iter_mut() {
            if task.next_due > now {
                continue;
            }
            task.next_due = now + task.period;
            match (task.handler)().await {
                Ok(()) => {
                    if task.currently_failing {
                        info!(task = %task.name, "periodic task recovered");
                        task.currently_failing = false;
                    }
                }
                Err(e) => {
                    crate::core::metrics::TASK_FAILURES_TOTAL.with_label_values(&[&task.name]).inc();
                    if !task.currently_failing {
                        error!(task = %task.name, error = %e, "periodic task failed");
                        task.currently_failing = true;
                    }
                }
            }
        }
    }
}
