// tests/integration/scheduler_test.rs

use crate::integration::fixtures;
use cobalt::core::spec::Spec;
use cobalt::core::types::JobState;
use cobalt::scheduler::placement;
use cobalt::scheduler::policy;
use cobalt::scheduler::SchedulerState;
use std::collections::BTreeMap;

#[test]
fn add_reservation_then_query_all_by_name() {
    let mut state = SchedulerState::new();
    state.add_reservation(fixtures::reservation("maint", 0, 3600, vec!["p0"])).unwrap();

    let spec = Spec::new().with("name", "maint");
    let hits = state.query_reservations(&[spec]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "maint");
}

#[test]
fn add_reservation_rejects_a_duplicate_name() {
    let mut state = SchedulerState::new();
    state.add_reservation(fixtures::reservation("maint", 0, 3600, vec!["p0"])).unwrap();
    assert!(state.add_reservation(fixtures::reservation("maint", 100, 200, vec!["p1"])).is_err());
}

#[test]
fn an_idle_job_on_an_idle_matching_partition_is_placed_immediately() {
    let job = fixtures::job(1, "default", 32, JobState::Queued);
    let p32 = fixtures::partition("p32", 32, "default");
    let partitions: BTreeMap<String, &cobalt::core::types::Partition> = [("p32".to_string(), &p32)].into_iter().collect();
    let reservations = indexmap::IndexMap::new();
    let end_times = BTreeMap::new();
    let mut potential = BTreeMap::new();

    let placed = policy::place_queue(&[&job], &partitions, &reservations, &end_times, &mut potential, 0, 24);

    assert_eq!(placed, vec![(1, "p32".to_string())]);
}

#[test]
fn a_job_cannot_be_placed_on_a_partition_held_by_an_overlapping_reservation() {
    let mut job = fixtures::job(1, "default", 32, JobState::Queued);
    job.walltime = 60;
    let p32 = fixtures::partition("p32", 32, "default");
    let partitions: BTreeMap<String, &cobalt::core::types::Partition> = [("p32".to_string(), &p32)].into_iter().collect();

    let mut reservations = indexmap::IndexMap::new();
    // The reservation's window overlaps the job's prospective run, and the
    // job is neither in the reservation's queue nor its user list.
    reservations.insert("maint".to_string(), fixtures::reservation("maint", 0, 7200, vec!["p32"]));

    let end_times = BTreeMap::new();
    let mut potential = BTreeMap::new();

    let placed = policy::place_queue(&[&job], &partitions, &reservations, &end_times, &mut potential, 0, 24);
    assert!(placed.is_empty());
}

#[test]
fn a_job_entitled_by_the_reservation_queue_can_still_place_on_it() {
    let job = fixtures::job(1, "R.maint", 32, JobState::Queued);
    let p32 = fixtures::partition("p32", 32, "R.maint");
    let partitions: BTreeMap<String, &cobalt::core::types::Partition> = [("p32".to_string(), &p32)].into_iter().collect();

    let mut reservations = indexmap::IndexMap::new();
    reservations.insert("maint".to_string(), fixtures::reservation("maint", 0, 7200, vec!["p32"]));

    let candidates = placement::candidates(&job, &partitions, &reservations);
    assert_eq!(candidates.len(), 1);
    let filtered = placement::filter_reservation_overlap(&job, candidates, &reservations, 0);
    assert_eq!(filtered.len(), 1, "the reservation's own queue is entitled to its partitions");
}

#[test]
fn backfill_is_rejected_once_the_drain_window_exceeds_the_configured_maximum() {
    let job = fixtures::job(1, "default", 32, JobState::Queued);
    let p32 = fixtures::partition("p32", 32, "default");
    let mut end_times = BTreeMap::new();
    end_times.insert("p32".to_string(), 100 * 3600);

    assert!(!placement::can_backfill(&job, &p32, &end_times, 0, 24));
    assert!(placement::can_backfill(&job, &p32, &end_times, 0, 200));
}
