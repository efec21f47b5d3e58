// tests/integration/queue_manager_test.rs

use crate::integration::fixtures;
use cobalt::core::spec::Spec;
use cobalt::core::types::{JobState, QueueState};
use cobalt::queue_manager::{dependencies, QueueManagerState};

#[test]
fn add_queue_then_query_all_matches_either_spec() {
    let mut state = QueueManagerState::new();
    state.add_queue(fixtures::queue("default", "fifo")).unwrap();
    state.add_queue(fixtures::queue("short", "fifo")).unwrap();
    state.add_queue(fixtures::queue("R.maint", "fifo")).unwrap();

    let by_name = Spec::new().with("name", "short");
    let by_policy = Spec::new().with("policy", "fifo");
    // OR-semantics: matching on name="short" alone still pulls in anything
    // else matched by a second spec in the same call.
    let hits = state.query_queues(&[by_name]);
    assert_eq!(hits.len(), 1);
    let hits = state.query_queues(&[by_policy]);
    assert_eq!(hits.len(), 3);
}

#[test]
fn del_queues_marks_reservation_queue_dead_instead_of_removing_it() {
    let mut state = QueueManagerState::new();
    state.add_queue(fixtures::queue("R.maint", "fifo")).unwrap();

    let spec = Spec::new().with("name", "R.maint");
    let removed = state.del_queues(&[spec.clone()], true).unwrap();
    assert_eq!(removed, vec!["R.maint".to_string()]);
    assert_eq!(state.queues["R.maint"].state, QueueState::Dead);
}

#[test]
fn del_queues_force_removes_a_regular_queue_outright() {
    let mut state = QueueManagerState::new();
    state.add_queue(fixtures::queue("default", "fifo")).unwrap();

    let spec = Spec::new().with("name", "default");
    state.del_queues(&[spec.clone()], true).unwrap();
    assert!(!state.queues.contains_key("default"));

    // Without force, it's only marked dead.
    state.add_queue(fixtures::queue("default", "fifo")).unwrap();
    state.del_queues(&[spec], false).unwrap();
    assert_eq!(state.queues["default"].state, QueueState::Dead);
}

#[test]
fn a_job_waiting_on_a_successful_dependency_is_released_to_queued() {
    let mut state = QueueManagerState::new();
    let mut upstream = fixtures::job(100, "default", 32, JobState::Done);
    upstream.exit_status = Some(0);
    state.jobs.insert(100, upstream);

    let mut dependent = fixtures::job(101, "default", 32, JobState::DepHold);
    dependent.all_dependencies.insert(100);
    state.jobs.insert(101, dependent);

    let transitions: Vec<(i64, JobState)> =
        state.jobs.values().filter_map(|job| dependencies::reevaluate(job, &state.jobs).map(|next| (job.jobid, next))).collect();
    assert_eq!(transitions, vec![(101, JobState::Queued)]);
}

#[test]
fn a_job_waiting_on_a_failed_dependency_is_failed_outright() {
    let mut state = QueueManagerState::new();
    let mut upstream = fixtures::job(200, "default", 32, JobState::Done);
    upstream.exit_status = Some(1);
    state.jobs.insert(200, upstream);

    let mut dependent = fixtures::job(201, "default", 32, JobState::DepHold);
    dependent.all_dependencies.insert(200);
    state.jobs.insert(201, dependent);

    let transitions: Vec<(i64, JobState)> =
        state.jobs.values().filter_map(|job| dependencies::reevaluate(job, &state.jobs).map(|next| (job.jobid, next))).collect();
    assert_eq!(transitions, vec![(201, JobState::DepFail)]);
}

#[test]
fn set_jobs_moves_a_queued_job_to_running_and_rejects_the_reverse() {
    let mut state = QueueManagerState::new();
    state.jobs.insert(1, fixtures::job(1, "default", 32, JobState::Queued));

    let spec = Spec::new().with("jobid", 1);
    let to_running = Spec::new().with("state", serde_json::to_value(JobState::Running).unwrap());
    state.set_jobs(&[spec.clone()], &to_running).unwrap();
    assert_eq!(state.jobs[&1].state, JobState::Running);

    let back_to_queued = Spec::new().with("state", serde_json::to_value(JobState::Queued).unwrap());
    assert!(state.set_jobs(&[spec], &back_to_queued).is_err());
    assert_eq!(state.jobs[&1].state, JobState::Running, "a rejected transition must leave the job untouched");
}
