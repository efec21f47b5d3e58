// src/queue_manager/dependencies.rs

//! Job dependency resolution.
//!
//! A job holds a set of dependency jobids. It sits in `dep_hold` until every
//! dependency reaches `done` with exit status `0`; if any dependency reaches
//! `done` with a non-zero exit, or is deleted with no exit recorded, the job
//! moves to `dep_fail` and never runs.

use crate::core::types::{Job, JobState};

/// Parses the original's colon-separated `all_dependencies` string
/// (`"100:101:102"`) into a set of jobids.
pub fn parse_dependency_string(raw: &str) -> Vec<i64> {
    raw.split(':').filter(|s| !s.is_empty()).filter_map(|s| s.parse().ok()).collect()
}

/// Re-evaluates one job's dependency state against the current job table,
/// returning the new state if it should change.
///
/// Grounded on the original's dependency tracking in QM's job lifecycle:
/// a `done` dependency with `exit_status == 0` satisfies it; a
/// `done` dependency with nonzero exit, or a dependency that has vanished
/// from the job table entirely (deleted with no exit), fails it outright.
pub fn reevaluate(job: &Job, all_jobs: &indexmap::IndexMap<i64, Job>) -> Option<JobState> {
    if job.state != JobState::DepHold {
        return None;
    }

    let mut all_satisfied = true;

    for &dep in &job.all_dependencies {
        match all_jobs.get(&dep) {
            None => return Some(JobState::DepFail),
            Some(dep_job) => {
                if dep_job.state == JobState::Done {
                    match dep_job.exit_status {
                        Some(0) => continue,
                        Some(_) => return Some(JobState::DepFail),
                        None => return Some(JobState::DepFail),
                    }
                }
                all_satisfied = false;
            }
        }
    }

    if all_satisfied {
        Some(JobState::Queued)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mode;
    use std::collections::BTreeSet;

    fn job(jobid: i64, state: JobState, deps: &[i64]) -> Job {
        Job {
            jobid,
            user: "bob".into(),
            queue: "default".into(),
            nodes: 1,
            procs: 1,
            mode: Mode::Co,
            walltime: 15,
            walltime_p: None,
            kernel: None,
            location: None,
            all_dependencies: deps.iter().copied().collect(),
            satisfied_dependencies: BTreeSet::new(),
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

    #[test]
    fn parses_colon_separated_dependency_list() {
        assert_eq!(parse_dependency_string("100:101:102"), vec![100, 101, 102]);
        assert_eq!(parse_dependency_string(""), Vec::<i64>::new());
    }

    #[test]
    fn scenario_2_dependency_succeeds_then_fails() {
        let mut all_jobs = indexmap::IndexMap::new();
        let dependent = job(101, JobState::DepHold, &[100]);
        all_jobs.insert(101, dependent.clone());

        let mut done_ok = job(100, JobState::Done, &[]);
        done_ok.exit_status = Some(0);
        all_jobs.insert(100, done_ok);
        assert_eq!(reevaluate(&dependent, &all_jobs), Some(JobState::Queued));

        let mut done_fail = job(100, JobState::Done, &[]);
        done_fail.exit_status = Some(1);
        all_jobs.insert(100, done_fail);
        assert_eq!(reevaluate(&dependent, &all_jobs), Some(JobState::DepFail));
    }

    #[test]
    fn deleted_dependency_fails_the_dependent() {
        let all_jobs = indexmap::IndexMap::new();
        let dependent = job(101, JobState::DepHold, &[100]);
        assert_eq!(reevaluate(&dependent, &all_jobs), Some(JobState::DepFail));
    }
}
