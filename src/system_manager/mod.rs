// src/system_manager/mod.rs

//! The System Manager (SM): authoritative resource inventory, partition
//! state machine, and process-group lifecycle.

pub mod diagnostics;
pub mod handlers;
pub mod process_groups;
pub mod state;
pub mod state_machine;
pub mod topology;

pub use state::SystemManagerState;

use crate::core::collaborators::bridge::Bridge;
use crate::core::collaborators::forker::Forker;
use crate::core::state::Runtime;
use std::sync::Arc;
use std::time::Duration;

/// Wires up the SM's exposed methods and automatic tasks on an already
/// allocated `Runtime`.
pub async fn build_runtime(
    runtime: &mut Runtime<SystemManagerState>,
    bridge: Arc<dyn Bridge>,
    mpirun_forker: Arc<dyn Forker>,
    script_forker: Arc<dyn Forker>,
) {
    handlers::register(runtime, bridge.clone(), mpirun_forker.clone(), script_forker.clone());

    let state = runtime.state.clone();
    let bridge_for_task = bridge.clone();
    runtime
        .tasks
        .register("partition_state_update", Duration::from_secs(10), move || {
            let state = state.clone();
            let bridge = bridge_for_task.clone();
            async move {
                let snapshot = state_machine::fetch_snapshot(&bridge).await;
                let now = chrono::Utc::now().timestamp();
                let actions = {
                    let mut guard = state.lock().await;
                    state_machine::apply_snapshot(&mut guard, &snapshot, now)
                };
                state_machine::destroy_all(&bridge, actions.to_destroy).await;
                state_machine::reset_kernels(&bridge, actions.to_reset_kernel).await;
                Ok(())
            }
        })
        .await;

    let state = runtime.state.clone();
    runtime
        .tasks
        .register("reap_process_groups", Duration::from_secs(10), move || {
            let state = state.clone();
            let mpirun_forker = mpirun_forker.clone();
            let script_forker = script_forker.clone();
            async move {
                process_groups::reap_cycle(&state, &mpirun_forker, &script_forker).await;
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
