// src/scheduler/mod.rs

//! The Scheduler: reservations plus the periodic placement cycle.

pub mod foreign_data;
pub mod handlers;
pub mod placement;
pub mod policy;
pub mod state;

pub use state::SchedulerState;

use crate::config::SchedulerConfig;
use crate::core::rpc_client::ComponentClient;
use crate::core::spec::Spec;
use crate::core::state::Runtime;
use crate::core::types::{Job, JobState, Partition, Queue, Reservation};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn all_spec() -> Vec<Spec> {
    vec![Spec::new().with("name", "*")]
}

/// A queue's activity for this cycle: regular queues follow `state`; a
/// reservation queue's activity instead tracks its reservation's window.
fn queue_is_active(queue: &Queue, reservations: &IndexMap<String, Reservation>, now: i64) -> bool {
    if queue.is_reservation_queue() {
        let name = queue.name.strip_prefix("R.").unwrap_or(&queue.name);
        reservations.get(name).map(|r| r.is_active(now)).unwrap_or(false)
    } else {
        queue.is_regularly_active()
    }
}

/// Wires up the scheduler's exposed methods and the periodic placement
/// cycle on an already allocated `Runtime`.
pub async fn build_runtime(
    runtime: &mut Runtime<SchedulerState>,
    queue_manager: Arc<ComponentClient>,
    system_manager: Arc<ComponentClient>,
    config: &SchedulerConfig,
) {
    handlers::register(runtime, queue_manager.clone());

    let state = runtime.state.clone();
    let qm = queue_manager.clone();
    let sm = system_manager.clone();
    let walltime_prediction = config.walltime_prediction;
    let max_drain_hours = config.max_drain_hours;
    runtime
        .tasks
        .register("schedule", Duration::from_secs(config.tick_interval_secs), move || {
            let state = state.clone();
            let qm = qm.clone();
            let sm = sm.clone();
            async move {
                let now = chrono::Utc::now().timestamp();

                // Fetch foreign data outside the lock; only the write-back
                // below needs it.
                let jobs_result = qm.call::<_, Vec<Job>>("get_jobs", (all_spec(),)).await;
                let queues_result = qm.call::<_, Vec<Queue>>("get_queues", (all_spec(),)).await;
                let partitions_result = sm.call::<_, Vec<Partition>>("get_partitions", (all_spec(),)).await;

                let mut guard = state.lock().await;
                guard.jobs.apply("jobs", jobs_result, |j| j.jobid);
                guard.queues.apply("queues", queues_result, |q| q.name.clone());
                guard.partitions.apply("partitions", partitions_result, |p| p.name.clone());

                if guard.jobs.sync_failed || guard.queues.sync_failed || guard.partitions.sync_failed {
                    warn!("skipping scheduling cycle: foreign data sync failed");
                    return Ok(());
                }

                let active_names: BTreeSet<String> = guard
                    .queues
                    .items
                    .values()
                    .filter(|q| queue_is_active(q, &guard.reservations, now))
                    .map(|q| q.name.clone())
                    .collect();

                let active_queues: Vec<&Queue> = guard.queues.items.values().filter(|q| active_names.contains(&q.name)).collect();

                let mut jobs_by_queue: BTreeMap<String, Vec<&Job>> = BTreeMap::new();
                for job in placement::viable_jobs(guard.jobs.items.values(), &active_names) {
                    jobs_by_queue.entry(job.queue.clone()).or_default().push(job);
                }

                let partitions_map: BTreeMap<String, &Partition> = guard.partitions.items.values().map(|p| (p.name.clone(), p)).collect();

                let mut end_times: BTreeMap<String, i64> = BTreeMap::new();
                for job in guard.jobs.items.values() {
                    if job.state != JobState::Running {
                        continue;
                    }
                    if let (Some(location), Some(start)) = (job.location.as_ref(), job.starttime) {
                        end_times.insert(location.clone(), start + 60 * job.effective_walltime(walltime_prediction) as i64);
                    }
                }

                let classes = placement::find_queue_equivalence_classes(&active_queues, &partitions_map);

                let mut potential: BTreeMap<i64, Vec<String>> = BTreeMap::new();
                let mut placements: Vec<(i64, String)> = Vec::new();

                for class in classes {
                    let class_queues: Vec<&Queue> = active_queues.iter().copied().filter(|q| class.contains(&q.name)).collect();
                    for queue in policy::order_queues_for_cycle(&class_queues, &jobs_by_queue) {
                        let Some(jobs) = jobs_by_queue.get(&queue.name) else { continue };
                        let placed = policy::place_queue(jobs, &partitions_map, &guard.reservations, &end_times, &mut potential, now, max_drain_hours);
                        placements.extend(placed);
                    }
                }

                drop(guard);

                if !placements.is_empty() {
                    if let Err(e) = qm.call::<_, Value>("run_jobs", (placements,)).await {
                        warn!(error = %e, "run_jobs call failed");
                    }
                }

                Ok(())
            }
        })
        .await;

    let state = runtime.state.clone();
    let store = runtime.store.clone();
    runtime
        .tasks
        .register("persist_state", Duration::from_secs(30), move || {
            let state = state.clone();
            let store = store.clone();
            async move {
                let guard = state.lock().await;
                store.save(&*guard).await
            }
        })
        .await;
}
