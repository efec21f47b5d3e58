// src/scheduler/policy.rs

//! Placement policies: `default` (FIFO + backfill),
//! `high-prio` (starves lower-priority queues while it has idle jobs), and
//! `scavenger` (defers while any other active queue has idle jobs).
//!
//! The three policies only differ in which queues get a turn to place jobs
//! this cycle; once a queue is selected, every policy uses the same FIFO +
//! backfill placement mechanics (`place_queue`). This resolves an Open
//! Question left by the distilled spec about what "high-prio"/"scavenger"
//! change about the placement *algorithm* itself — recorded in DESIGN.md.

use crate::core::types::{Job, Partition, Queue, Reservation};
use std::collections::BTreeMap;

use super::placement::{can_backfill, candidates, filter_reservation_overlap, tidy_placements};

pub const DEFAULT: &str = "default";
pub const HIGH_PRIO: &str = "high-prio";
pub const SCAVENGER: &str = "scavenger";

/// Orders active queues for this scheduling cycle, applying the
/// `high-prio`/`scavenger` starvation rules. `jobs_by_queue` need only
/// contain queued jobs (the "viable" set already restricts to that).
pub fn order_queues_for_cycle<'a>(queues: &[&'a Queue], jobs_by_queue: &BTreeMap<String, Vec<&Job>>) -> Vec<&'a Queue> {
    let has_queued = |q: &Queue| jobs_by_queue.get(&q.name).map(|j| !j.is_empty()).unwrap_or(false);

    let high_prio_active = queues.iter().any(|q| q.policy == HIGH_PRIO && has_queued(q));
    if high_prio_active {
        return queues.iter().copied().filter(|q| q.policy == HIGH_PRIO).collect();
    }

    let any_non_scavenger_has_work = queues.iter().any(|q| q.policy != SCAVENGER && has_queued(q));
    queues
        .iter()
        .copied()
        .filter(|q| q.policy != SCAVENGER || !any_non_scavenger_has_work)
        .collect()
}

/// FIFO + backfill placement for one queue's viable jobs (already sorted by
/// fifo key). Mutates `potential` in place so later queues in the same cycle
/// see the tidy-up from this queue's placements.
pub fn place_queue(
    jobs: &[&Job],
    partitions: &BTreeMap<String, &Partition>,
    reservations: &indexmap::IndexMap<String, Reservation>,
    end_times: &BTreeMap<String, i64>,
    potential: &mut BTreeMap<i64, Vec<String>>,
    now: i64,
    max_drain_hours: u32,
) -> Vec<(i64, String)> {
    let mut placements = Vec::new();

    for job in jobs {
        let list = potential.entry(job.jobid).or_insert_with(|| {
            filter_reservation_overlap(job, candidates(job, partitions, reservations), reservations, now)
                .into_iter()
                .map(|p| p.name.clone())
                .collect()
        });

        let immediate = list.iter().find(|name| partitions.get(*name).map(|p| p.used_by.is_none()).unwrap_or(false)).cloned();

        let chosen = immediate.or_else(|| {
            list.iter()
                .find(|name| partitions.get(*name).map(|p| can_backfill(job, p, end_times, now, max_drain_hours)).unwrap_or(false))
                .cloned()
        });

        if let Some(name) = chosen {
            placements.push((job.jobid, name.clone()));
            if let Some(p) = partitions.get(&name) {
                tidy_placements(potential, p);
            }
        }
    }

    placements
}
