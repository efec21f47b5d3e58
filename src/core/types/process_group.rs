// src/core/types/process_group.rs

//! Process group: the System Manager's handle on a running job's launcher
//! process tree.

use serde::{Deserialize, Serialize};

use super::job::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessGroup {
    /// Assigned from a monotonic generator at creation time.
    pub id: i64,
    pub jobid: i64,
    pub user: String,
    pub location: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    pub starttime: i64,
    /// Requested walltime in minutes, used to compute the reservation
    /// deadline `start + 60*walltime + 60*killtime`.
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

    /// The forker-assigned head pid; `None` until the forker confirms a
    /// successful start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_pid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signum: Option<i32>,
    #[serde(default)]
    pub core_dump: bool,
}

impl ProcessGroup {
    pub fn reservation_deadline(&self) -> i64 {
        self.starttime + 60 * self.walltime as i64 + 60 * self.killtime as i64
    }

    pub fn has_exited(&self) -> bool {
        self.exit_status.is_some()
    }

    /// The magic "we lost track of this child" exit status used by the
    /// reap/poll cycle.
    pub const UNKNOWN_EXIT_STATUS: i64 = 1234567;
}
