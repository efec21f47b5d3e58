// src/core/types/job.rs

//! Job entity and state machine.

use crate::core::spec::{Matchable, Spec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Co,
    Dual,
    Vn,
    Smp,
    Script,
}

/// The job states, preserved verbatim as wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Hold,
    UserHold,
    Running,
    Killing,
    Done,
    DepHold,
    DepFail,
}

impl JobState {
    /// The allowed transition edges. `set_jobs` must reject any
    /// request that isn't one of these.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Queued, Hold)
                | (Hold, Queued)
                | (Queued, UserHold)
                | (UserHold, Queued)
                | (DepHold, Queued)
                | (DepHold, DepFail)
                | (Queued, Running)
                | (Running, Killing)
                | (Running, Done)
                | (Killing, Done)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub jobid: i64,
    pub user: String,
    pub queue: String,
    pub nodes: u32,
    pub procs: u32,
    pub mode: Mode,
    /// Requested walltime in minutes.
    pub walltime: u32,
    /// Predicted walltime in minutes, used for backfill eligibility only when
    /// `walltime_prediction` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub walltime_p: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub all_dependencies: BTreeSet<i64>,
    #[serde(default)]
    pub satisfied_dependencies: BTreeSet<i64>,
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i64>,
    pub submittime: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttime: Option<i64>,
    /// FIFO ordering key; falls back to `jobid` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub cwd: String,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Job {
    /// The effective walltime used for backfill math: predicted if the
    /// toggle is on and a prediction exists, else the requested walltime.
    pub fn effective_walltime(&self, use_prediction: bool) -> u32 {
        if use_prediction {
            self.walltime_p.unwrap_or(self.walltime)
        } else {
            self.walltime
        }
    }

    pub fn fifo_key(&self) -> i64 {
        self.index.unwrap_or(self.jobid)
    }
}

impl Matchable for Job {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "jobid" => Some(Value::from(self.jobid)),
            "user" => Some(Value::String(self.user.clone())),
            "queue" => Some(Value::String(self.queue.clone())),
            "nodes" => Some(Value::from(self.nodes)),
            "procs" => Some(Value::from(self.procs)),
            "state" => serde_json::to_value(self.state).ok(),
            "location" => self.location.clone().map(Value::String),
            "exit_status" => self.exit_status.map(Value::from),
            _ => None,
        }
    }

    fn apply_update(&mut self, update: &Spec) {
        if let Some(Value::String(queue)) = update.get("queue") {
            self.queue = queue.clone();
        }
        if let Some(raw_state) = update.get("state") {
            if let Ok(state) = serde_json::from_value::<JobState>(raw_state.clone()) {
                self.state = state;
            }
        }
        if let Some(Value::String(loc)) = update.get("location") {
            self.location = Some(loc.clone());
        }
        if let Some(v) = update.get("exit_status") {
            self.exit_status = v.as_i64();
        }
        if let Some(v) = update.get("starttime") {
            self.starttime = v.as_i64();
        }
    }
}
