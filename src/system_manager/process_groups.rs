// src/system_manager/process_groups.rs

//! Process-group creation and reaping.

use crate::core::collaborators::bridge::Bridge;
use crate::core::collaborators::forker::{Forker, RpcForker, StartSpec};
use crate::core::errors::CobaltError;
use crate::core::types::{Mode, ProcessGroup};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use super::state::SystemManagerState;

/// Input to `add_process_groups`: everything the caller supplies for one new
/// process group, before an `id`/`starttime`/`head_pid` are assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProcessGroupSpec {
    pub jobid: i64,
    pub user: String,
    pub location: String,
    pub mode: Mode,
    pub kernel: Option<String>,
    pub walltime: u32,
    pub killtime: u32,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub cwd: String,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub executable: String,
    #[serde(default)]
    pub umask: u32,
}

/// Creates one process group end to end: reserve, set boot image, start via
/// the mode-appropriate forker. A failure at any of the first two steps
/// completes the pg immediately with `exit_status = 255` (no process ever
/// spawned) rather than erroring the call, since the caller still needs a pg
/// record to report back to the Queue Manager. A transient forker failure is
/// re-raised instead, so the Queue Manager retries `run_jobs` next cycle.
pub async fn add_one(
    state: &Arc<Mutex<SystemManagerState>>,
    bridge: &Arc<dyn Bridge>,
    mpirun_forker: &Arc<dyn Forker>,
    script_forker: &Arc<dyn Forker>,
    spec: NewProcessGroupSpec,
    now: i64,
) -> Result<ProcessGroup, CobaltError> {
    let id = state.lock().await.next_pg_id();
    let mut pg = ProcessGroup {
        id,
        jobid: spec.jobid,
        user: spec.user.clone(),
        location: spec.location.clone(),
        mode: spec.mode,
        kernel: spec.kernel.clone(),
        starttime: now,
        walltime: spec.walltime,
        killtime: spec.killtime,
        stdin: spec.stdin.clone(),
        stdout: spec.stdout.clone(),
        stderr: spec.stderr.clone(),
        cwd: spec.cwd.clone(),
        env: spec.env.clone(),
        args: spec.args.clone(),
        executable: spec.executable.clone(),
        umask: spec.umask,
        head_pid: None,
        exit_status: None,
        signum: None,
        core_dump: false,
    };

    let deadline = now + 60 * spec.walltime as i64 + 60 * spec.killtime as i64;
    let reserved = {
        let mut guard = state.lock().await;
        guard.reserve_resources_until(&spec.location, Some(deadline), spec.jobid)
    };
    if let Err(e) = reserved {
        warn!(jobid = spec.jobid, location = %spec.location, error = %e, "reservation failed, process group fails immediately");
        pg.exit_status = Some(255);
        state.lock().await.process_groups.insert(pg.id, pg.clone());
        return Ok(pg);
    }

    if let Some(kernel) = spec.kernel.as_deref() {
        if kernel != "default" {
            if let Err(e) = bridge.set_boot_image(&spec.location, kernel).await {
                warn!(jobid = spec.jobid, kernel, error = %e, "boot image change failed");
                let mut guard = state.lock().await;
                let _ = guard.reserve_resources_until(&spec.location, None, spec.jobid);
                pg.exit_status = Some(255);
                guard.process_groups.insert(pg.id, pg.clone());
                return Ok(pg);
            }
        }
    }

    let forker = if spec.mode == Mode::Script { script_forker } else { mpirun_forker };
    let start_spec = StartSpec {
        jobid: spec.jobid,
        executable: spec.executable.clone(),
        args: spec.args.clone(),
        env: spec.env.clone(),
        cwd: spec.cwd.clone(),
        user: spec.user.clone(),
        umask: spec.umask,
        location: spec.location.clone(),
    };

    match forker.start(start_spec).await {
        Ok(pid) => pg.head_pid = Some(pid),
        Err(e @ CobaltError::Transient { .. }) => return Err(e),
        Err(e) => {
            warn!(jobid = spec.jobid, error = %e, "forker start failed");
            let mut guard = state.lock().await;
            let _ = guard.reserve_resources_until(&spec.location, None, spec.jobid);
            pg.exit_status = Some(255);
        }
    }

    state.lock().await.process_groups.insert(pg.id, pg.clone());
    Ok(pg)
}

/// The periodic reap/poll task: for each forker, diffs its active-pid list
/// against local process groups, records exits, and sweeps orphans.
pub async fn reap_cycle(state: &Arc<Mutex<SystemManagerState>>, mpirun_forker: &Arc<dyn Forker>, script_forker: &Arc<dyn Forker>) {
    let forkers: [(&'static str, &Arc<dyn Forker>); 2] =
        [(RpcForker::component_name_for_mode(Mode::Co), mpirun_forker), (RpcForker::component_name_for_mode(Mode::Script), script_forker)];

    for (name, forker) in forkers {
        let active: BTreeSet<i64> = match forker.active_list().await {
            Ok(list) => list.into_iter().collect(),
            Err(e) => {
                warn!(forker = name, error = %e, "failed to list active children");
                continue;
            }
        };

        let exited: Vec<(i64, i64, String, i64)> = {
            let guard = state.lock().await;
            guard
                .process_groups
                .values()
                .filter(|pg| !pg.has_exited())
                .filter(|pg| RpcForker::component_name_for_mode(pg.mode) == name)
                .filter_map(|pg| pg.head_pid.map(|pid| (pg.id, pid, pg.location.clone(), pg.jobid)))
                .filter(|(_, pid, _, _)| !active.contains(pid))
                .collect()
        };

        let mut cleanup_ids = Vec::with_capacity(exited.len());
        for (pg_id, pid, location, jobid) in exited {
            let status = forker.get_status(pid).await;
            let mut guard = state.lock().await;
            if let Some(pg) = guard.process_groups.get_mut(&pg_id) {
                match status {
                    Ok(Some(s)) => {
                        pg.exit_status = Some(s.exit_status.unwrap_or(ProcessGroup::UNKNOWN_EXIT_STATUS));
                        pg.signum = s.signum;
                        pg.core_dump = s.core_dump;
                    }
                    _ => pg.exit_status = Some(ProcessGroup::UNKNOWN_EXIT_STATUS),
                }
            }
            let _ = guard.reserve_resources_until(&location, None, jobid);
            if let Some(p) = guard.partitions.get_mut(&location) {
                p.cleanup_pending = true;
            }
            cleanup_ids.push(pid);
        }

        if !cleanup_ids.is_empty() {
            if let Err(e) = forker.cleanup_children(cleanup_ids).await {
                warn!(forker = name, error = %e, "cleanup_children failed");
            }
        }
    }
}
