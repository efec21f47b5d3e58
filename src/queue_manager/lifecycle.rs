// src/queue_manager/lifecycle.rs

//! `run_jobs`: QM asks the System Manager to create a process group for
//! each placement; transient RPC
//! failures leave the job `queued` for the next cycle, validation faults
//! mark it `done` with a failure reason recorded.

use crate::core::errors::CobaltError;
use crate::core::rpc_client::ComponentClient;
use crate::core::types::JobState;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::state::QueueManagerState;

#[derive(Debug, Clone, Serialize)]
struct ProcessGroupSpec {
    jobid: i64,
    user: String,
    location: String,
    mode: crate::core::types::Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    kernel: Option<String>,
    cwd: String,
    env: Vec<String>,
    args: Vec<String>,
    stdin: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    walltime: u32,
}

/// The outcome of one `run_jobs` attempt for a single `(jobid, location)`
/// pair, used by the caller to decide what state transition to apply.
pub enum RunOutcome {
    Started,
    RetryNextCycle,
    Failed { reason: String },
}

/// Snapshots the fields `add_process_groups` needs for one job, while the
/// caller still holds the state lock. Returns `None` if the job has since
/// vanished.
pub fn build_process_group_spec(state: &QueueManagerState, jobid: i64, location: &str) -> Option<impl Serialize> {
    let job = state.jobs.get(&jobid)?;
    Some(ProcessGroupSpec {
        jobid,
        user: job.user.clone(),
        location: location.to_string(),
        mode: job.mode,
        kernel: job.kernel.clone(),
        cwd: job.cwd.clone(),
        env: job.env.clone(),
        args: job.args.clone(),
        stdin: job.stdin.clone(),
        stdout: job.stdout.clone(),
        stderr: job.stderr.clone(),
        walltime: job.walltime,
    })
}

/// Calls `SM.add_process_groups` for one placement. Takes no lock itself —
/// the spec is built and the outcome applied under the state lock, but the
/// blocking RPC call itself runs lock-free.
pub async fn call_add_process_group(
    system_manager: &ComponentClient,
    jobid: i64,
    location: &str,
    spec: impl Serialize,
) -> RunOutcome {
    match system_manager.call::<_, Value>("add_process_groups", vec![spec]).await {
        Ok(_) => {
            info!(jobid, location, "process group created");
            RunOutcome::Started
        }
        Err(CobaltError::Transient { .. }) => {
            warn!(jobid, location, "transient failure creating process group, retrying next cycle");
            RunOutcome::RetryNextCycle
        }
        Err(e @ CobaltError::Validation(_)) => RunOutcome::Failed { reason: e.to_string() },
        Err(e) => RunOutcome::Failed { reason: e.to_string() },
    }
}

pub fn apply_outcome(state: &mut QueueManagerState, jobid: i64, location: &str, outcome: RunOutcome) {
    match outcome {
        RunOutcome::Started => {
            if let Some(job) = state.jobs.get_mut(&jobid) {
                job.state = JobState::Running;
                job.location = Some(location.to_string());
            }
        }
        RunOutcome::RetryNextCycle => {}
        RunOutcome::Failed { reason } => {
            if let Some(job) = state.jobs.get_mut(&jobid) {
                job.state = JobState::Done;
                job.exit_status = Some(255);
                warn!(jobid, reason, "job failed during run_jobs");
            }
        }
    }
}
