// src/queue_manager/state.rs

//! Queue Manager owned state: jobs, queues, the jobid generator, and
//! dependency bookkeeping.

use crate::core::errors::CobaltError;
use crate::core::spec::{Matchable, Spec};
use crate::core::types::{Job, JobState, Queue, QueueState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Default, Serialize, Deserialize)]
pub struct QueueManagerState {
    pub jobs: IndexMap<i64, Job>,
    pub queues: IndexMap<String, Queue>,
    next_jobid: i64,
}

impl QueueManagerState {
    pub fn new() -> Self {
        Self { jobs: IndexMap::new(), queues: IndexMap::new(), next_jobid: 1 }
    }

    /// Jobids are monotone; assigns the next one and bumps the generator.
    pub fn next_jobid(&mut self) -> i64 {
        let id = self.next_jobid;
        self.next_jobid += 1;
        id
    }

    /// Setting the generator to `<=` the current max is a fault.
    pub fn set_jobid(&mut self, next: i64) -> Result<(), CobaltError> {
        if next <= self.next_jobid {
            return Err(CobaltError::validation(format!(
                "next jobid {next} must exceed current counter {}",
                self.next_jobid
            )));
        }
        self.next_jobid = next;
        Ok(())
    }

    pub fn query_jobs(&self, specs: &[Spec]) -> Vec<&Job> {
        self.jobs.values().filter(|j| specs.iter().any(|s| j.matches(s))).collect()
    }

    pub fn query_queues(&self, specs: &[Spec]) -> Vec<&Queue> {
        self.queues.values().filter(|q| specs.iter().any(|s| q.matches(s))).collect()
    }

    /// `set_jobs`: applies `update` to every job matching any of `specs`,
    /// rejecting illegal state transitions with fault code 30 (leaving the
    /// job unchanged).
    pub fn set_jobs(&mut self, specs: &[Spec], update: &Spec) -> Result<Vec<i64>, CobaltError> {
        let matching: Vec<i64> = self
            .jobs
            .values()
            .filter(|j| specs.iter().any(|s| j.matches(s)))
            .map(|j| j.jobid)
            .collect();

        if let Some(raw_state) = update.get("state") {
            let requested: JobState = serde_json::from_value(raw_state.clone())?;
            for &jobid in &matching {
                let current = self.jobs[&jobid].state;
                if !current.can_transition_to(requested) {
                    return Err(CobaltError::validation(format!(
                        "job {jobid}: illegal transition {current:?} -> {requested:?}"
                    )));
                }
            }
        }

        for &jobid in &matching {
            self.jobs.get_mut(&jobid).unwrap().apply_update(update);
        }
        Ok(matching)
    }

    pub fn del_jobs(&mut self, specs: &[Spec], force: bool) -> Result<Vec<i64>, CobaltError> {
        let matching: Vec<i64> =
            self.jobs.values().filter(|j| specs.iter().any(|s| j.matches(s))).map(|j| j.jobid).collect();

        for &jobid in &matching {
            let job = self.jobs.get_mut(&jobid).unwrap();
            match job.state {
                JobState::Running | JobState::Killing if !force => {
                    job.state = JobState::Killing;
                }
                _ => {
                    job.state = JobState::Done;
                }
            }
        }
        Ok(matching)
    }

    pub fn add_queue(&mut self, queue: Queue) -> Result<(), CobaltError> {
        if self.queues.contains_key(&queue.name) {
            return Err(CobaltError::conflict(format!("queue '{}' already exists", queue.name)));
        }
        self.queues.insert(queue.name.clone(), queue);
        Ok(())
    }

    /// Reservation queues are never removed, only marked `dead`, to preserve
    /// history. `force` on a regular queue still removes it outright.
    pub fn del_queues(&mut self, specs: &[Spec], force: bool) -> Result<Vec<String>, CobaltError> {
        let matching: Vec<String> =
            self.queues.values().filter(|q| specs.iter().any(|s| q.matches(s))).map(|q| q.name.clone()).collect();

        for name in &matching {
            if name.starts_with("R.") {
                if let Some(q) = self.queues.get_mut(name) {
                    q.state = QueueState::Dead;
                }
            } else if force {
                self.queues.shift_remove(name);
            } else {
                if let Some(q) = self.queues.get_mut(name) {
                    q.state = QueueState::Dead;
                }
            }
        }
        Ok(matching)
    }
}
