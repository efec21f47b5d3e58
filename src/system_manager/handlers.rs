// src/system_manager/handlers.rs

//! Exposed methods for process group management, wire names preserved.

use crate::core::collaborators::bridge::Bridge;
use crate::core::collaborators::forker::Forker;
use crate::core::spec::Spec;
use crate::core::state::Runtime;
use crate::core::types::Partition;
use serde_json::Value;
use std::sync::Arc;

use super::process_groups::{self, NewProcessGroupSpec};
use super::state::SystemManagerState;

pub fn register(
    runtime: &mut Runtime<SystemManagerState>,
    bridge: Arc<dyn Bridge>,
    mpirun_forker: Arc<dyn Forker>,
    script_forker: Arc<dyn Forker>,
) {
    let state = runtime.state.clone();
    runtime.methods.register("add_partitions", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Partition>,) = serde_json::from_value(params)?;
            let mut guard = state.lock().await;
            for p in specs {
                guard.add_partition(p)?;
            }
            Ok(Value::Null)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_partitions", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            Ok(serde_json::to_value(guard.query_partitions(&specs))?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("del_partitions", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let matched = state.lock().await.del_partitions(&specs);
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("set_partitions", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs, update): (Vec<Spec>, Spec) = serde_json::from_value(params)?;
            let matched = state.lock().await.set_partitions(&specs, &update);
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("reserve_resources_until", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (location, until, jobid): (String, Option<i64>, i64) = serde_json::from_value(params)?;
            state.lock().await.reserve_resources_until(&location, until, jobid)?;
            Ok(Value::Null)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("validate_job", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (nodecount, walltime, mode, proccount, kernel): (
                u32,
                u32,
                crate::core::types::Mode,
                u32,
                Option<String>,
            ) = serde_json::from_value(params)?;
            state.lock().await.validate_job(nodecount, walltime, mode, proccount, kernel.as_deref())?;
            Ok(Value::Bool(true))
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_process_groups", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            let matched: Vec<_> = guard.process_groups.values().filter(|pg| specs.iter().any(|s| pg_matches(pg, s))).collect();
            Ok(serde_json::to_value(matched)?)
        }
    });

    let state = runtime.state.clone();
    let bridge_for_add = bridge.clone();
    let mpirun_for_add = mpirun_forker.clone();
    let script_for_add = script_forker.clone();
    runtime.methods.register("add_process_groups", true, move |params: Value| {
        let state = state.clone();
        let bridge = bridge_for_add.clone();
        let mpirun_forker = mpirun_for_add.clone();
        let script_forker = script_for_add.clone();
        async move {
            let (specs,): (Vec<NewProcessGroupSpec>,) = serde_json::from_value(params)?;
            let now = chrono::Utc::now().timestamp();
            let mut created = Vec::with_capacity(specs.len());
            for spec in specs {
                let pg = process_groups::add_one(&state, &bridge, &mpirun_forker, &script_forker, spec, now).await?;
                created.push(pg);
            }
            Ok(serde_json::to_value(created)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("wait_process_groups", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let mut guard = state.lock().await;
            let done_ids: Vec<i64> = guard
                .process_groups
                .values()
                .filter(|pg| pg.has_exited() && specs.iter().any(|s| pg_matches(pg, s)))
                .map(|pg| pg.id)
                .collect();
            let mut done = Vec::with_capacity(done_ids.len());
            for id in done_ids {
                if let Some(pg) = guard.process_groups.shift_remove(&id) {
                    done.push(pg);
                }
            }
            Ok(serde_json::to_value(done)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("signal_process_groups", true, move |params: Value| {
        let state = state.clone();
        let mpirun_forker = mpirun_forker.clone();
        let script_forker = script_forker.clone();
        async move {
            let (specs, signame): (Vec<Spec>, Option<String>) = serde_json::from_value(params)?;
            let signame = signame.unwrap_or_else(|| "SIGTERM".to_string());
            let targets: Vec<(i64, crate::core::types::Mode)> = {
                let guard = state.lock().await;
                guard
                    .process_groups
                    .values()
                    .filter(|pg| !pg.has_exited() && specs.iter().any(|s| pg_matches(pg, s)))
                    .filter_map(|pg| pg.head_pid.map(|pid| (pid, pg.mode)))
                    .collect()
            };
            for (pid, mode) in targets {
                let forker: &Arc<dyn Forker> =
                    if mode == crate::core::types::Mode::Script { &script_forker } else { &mpirun_forker };
                if let Err(e) = forker.signal(pid, &signame).await {
                    tracing::warn!(pid, signal = %signame, error = %e, "failed to signal process group");
                }
            }
            Ok(Value::Null)
        }
    });
}

/// Process groups aren't `Matchable` (they're an internal/runtime entity,
/// not one of the spec-dict query targets), so matching here is by the
/// handful of fields the exposed methods actually filter on.
fn pg_matches(pg: &crate::core::types::ProcessGroup, spec: &Spec) -> bool {
    if let Some(v) = spec.get("id") {
        if v.as_i64() != Some(pg.id) {
            return false;
        }
    }
    if let Some(v) = spec.get("jobid") {
        if v.as_i64() != Some(pg.jobid) {
            return false;
        }
    }
    true
}
