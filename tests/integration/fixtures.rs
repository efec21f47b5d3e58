// tests/integration/fixtures.rs

//! Shared entity builders for the integration tests.

use cobalt::core::types::{
    Job, JobState, Mode, NodeCard, NodeCardState, Partition, PartitionState, ProcessGroup, Queue, QueueState, Reservation, Switch, SwitchState,
};
use std::collections::BTreeSet;

pub fn job(jobid: i64, queue: &str, nodes: u32, state: JobState) -> Job {
    Job {
        jobid,
        user: "alice".into(),
        queue: queue.into(),
        nodes,
        procs: nodes,
        mode: Mode::Co,
        walltime: 30,
        walltime_p: None,
        kernel: None,
        location: None,
        all_dependencies: Default::default(),
        satisfied_dependencies: Default::default(),
        state,
        exit_status: None,
        submittime: 0,
        starttime: None,
        index: None,
        stdin: None,
        stdout: None,
        stderr: None,
        cwd: "/".into(),
        env: vec![],
        args: vec![],
    }
}

pub fn partition(name: &str, size: u32, queue: &str) -> Partition {
    Partition {
        name: name.to_string(),
        size,
        queue: vec![queue.to_string()],
        scheduled: true,
        functional: true,
        state: PartitionState::Idle,
        node_cards: vec![],
        switches: vec![],
        parents: BTreeSet::new(),
        children: BTreeSet::new(),
        all_children: BTreeSet::new(),
        wiring_conflicts: BTreeSet::new(),
        reserved_by: None,
        reserved_until: None,
        used_by: None,
        cleanup_pending: false,
        backfill_time: None,
        draining: false,
    }
}

pub fn queue(name: &str, policy: &str) -> Queue {
    Queue {
        name: name.to_string(),
        state: QueueState::Running,
        policy: policy.to_string(),
        limits: Default::default(),
        users: vec![],
        adminemail: None,
        priority: 0,
        cron: None,
    }
}

pub fn reservation(name: &str, start: i64, duration: i64, partitions: Vec<&str>) -> Reservation {
    Reservation {
        name: name.to_string(),
        start,
        duration,
        cycle: 0,
        users: vec![],
        partitions: partitions.into_iter().map(String::from).collect(),
        res_id: None,
        cycle_id: None,
    }
}

pub fn node_card(id: &str) -> NodeCard {
    NodeCard { id: id.to_string(), state: NodeCardState::Idle, used_by: None }
}

pub fn switch(id: &str) -> Switch {
    Switch { id: id.to_string(), state: SwitchState::Idle }
}

pub fn process_group(id: i64, jobid: i64, location: &str, starttime: i64, walltime: u32) -> ProcessGroup {
    ProcessGroup {
        id,
        jobid,
        user: "alice".into(),
        location: location.to_string(),
        mode: Mode::Co,
        kernel: None,
        starttime,
        walltime,
        killtime: 5,
        stdin: None,
        stdout: None,
        stderr: None,
        cwd: "/".into(),
        env: vec![],
        args: vec![],
        executable: "/bin/true".into(),
        umask: 0,
        head_pid: None,
        exit_status: None,
        signum: None,
        core_dump: false,
    }
}
