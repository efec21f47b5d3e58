// src/queue_manager/mod.rs

//! The Queue Manager (QM): authoritative job and queue state.

pub mod dependencies;
pub mod filters;
pub mod handlers;
pub mod lifecycle;
pub mod state;

pub use state::QueueManagerState;

use crate::core::rpc_client::ComponentClient;
use crate::core::state::Runtime;
use crate::core::types::JobState;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Wires up the QM's exposed methods and automatic tasks on an already
/// allocated `Runtime`.
pub async fn build_runtime(runtime: &mut Runtime<QueueManagerState>, system_manager: Arc<ComponentClient>) {
    handlers::register(runtime, system_manager);

    let state = runtime.state.clone();
    runtime
        .tasks
        .register("dependency_check", Duration::from_secs(10), move || {
            let state = state.clone();
            async move {
                let mut guard = state.lock().await;
                let transitions: Vec<(i64, JobState)> = guard
                    .jobs
                    .values()
                    .filter_map(|job| dependencies::reevaluate(job, &guard.jobs).map(|next| (job.jobid, next)))
                    .collect();
                for (jobid, next) in transitions {
                    if let Some(job) = guard.jobs.get_mut(&jobid) {
                        info!(jobid, ?next, "dependency re-evaluation transitioned job");
                        job.state = next;
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
