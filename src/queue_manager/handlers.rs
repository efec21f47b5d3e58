// src/queue_manager/handlers.rs

//! Exposed methods, wire names preserved.

use crate::core::rpc_client::ComponentClient;
use crate::core::spec::Spec;
use crate::core::state::Runtime;
use crate::core::types::{Job, JobState, Queue};
use serde_json::Value;
use std::sync::Arc;

use super::lifecycle;
use super::state::QueueManagerState;

pub fn register(runtime: &mut Runtime<QueueManagerState>, system_manager: Arc<ComponentClient>) {
    let state = runtime.state.clone();
    runtime.methods.register("add_jobs", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Job>,) = serde_json::from_value(params)?;
            let mut guard = state.lock().await;
            let mut created = Vec::with_capacity(specs.len());
            for mut job in specs {
                job.jobid = guard.next_jobid();
                job.state = if job.all_dependencies.is_empty() { JobState::Queued } else { JobState::DepHold };
                created.push(job.jobid);
                guard.jobs.insert(job.jobid, job);
            }
            Ok(serde_json::to_value(created)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_jobs", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            let jobs: Vec<&Job> = guard.query_jobs(&specs);
            Ok(serde_json::to_value(jobs)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("set_jobs", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, update): (Vec<Spec>, Spec) = serde_json::from_value(params)?;
            let matched = state.lock().await.set_jobs(&specs, &update)?;
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("del_jobs", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, _user, force): (Vec<Spec>, String, Option<bool>) = serde_json::from_value(params)?;
            let matched = state.lock().await.del_jobs(&specs, force.unwrap_or(false))?;
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("move_jobs", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, new_queue): (Vec<Spec>, String) = serde_json::from_value(params)?;
            let update = Spec::new().with("queue", new_queue);
            let matched = state.lock().await.set_jobs(&specs, &update)?;
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("set_jobid", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (next,): (i64,) = serde_json::from_value(params)?;
            state.lock().await.set_jobid(next)?;
            Ok(Value::Null)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("add_queues", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Queue>,) = serde_json::from_value(params)?;
            let mut guard = state.lock().await;
            for queue in specs {
                guard.add_queue(queue)?;
            }
            Ok(Value::Null)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("del_queues", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, force): (Vec<Spec>, Option<bool>) = serde_json::from_value(params)?;
            let matched = state.lock().await.del_queues(&specs, force.unwrap_or(false))?;
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_queues", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            Ok(serde_json::to_value(guard.query_queues(&specs))?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("set_queues", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, update): (Vec<Spec>, Spec) = serde_json::from_value(params)?;
            let mut guard = state.lock().await;
            let matching: Vec<String> =
                guard.queues.values().filter(|q| specs.iter().any(|s| crate::core::spec::Matchable::matches(*q, s))).map(|q| q.name.clone()).collect();
            for name in &matching {
                if let Some(q) = guard.queues.get_mut(name) {
                    crate::core::spec::Matchable::apply_update(q, &update);
                }
            }
            Ok(serde_json::to_value(matching)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("can_run", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (queue_name,): (String,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            let runnable = guard.queues.get(&queue_name).map(|q| q.is_regularly_active()).unwrap_or(false);
            Ok(Value::Bool(runnable))
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("run_jobs", true, move |params: Value| {
        let state = state.clone();
        let system_manager = system_manager.clone();
        async move {
            let (placements,): (Vec<(i64, String)>,) = serde_json::from_value(params)?;
            let mut started = Vec::new();
            for (jobid, location) in placements {
                let spec = {
                    let guard = state.lock().await;
                    lifecycle::build_process_group_spec(&guard, jobid, &location)
                };
                let Some(spec) = spec else { continue };
                let outcome = lifecycle::call_add_process_group(&system_manager, jobid, &location, spec).await;
                let mut guard = state.lock().await;
                let was_started = matches!(outcome, lifecycle::RunOutcome::Started);
                lifecycle::apply_outcome(&mut guard, jobid, &location, outcome);
                if was_started {
                    started.push(jobid);
                }
            }
            Ok(serde_json::to_value(started)?)
        }
    });
}
