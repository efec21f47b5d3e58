// src/scheduler/placement.rs

//! Candidate selection, reservation-overlap filtering, backfill, and
//! equivalence classes.

use crate::core::types::{Job, Partition, Queue, Reservation};
use std::collections::{BTreeMap, BTreeSet};

/// Viable jobs, sorted by fifo key.
pub fn viable_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>, active_queues: &BTreeSet<String>) -> Vec<&'a Job> {
    let mut viable: Vec<&Job> = jobs
        .into_iter()
        .filter(|j| j.state == crate::core::types::JobState::Queued && active_queues.contains(&j.queue))
        .collect();
    viable.sort_by_key(|j| j.fifo_key());
    viable
}

/// Partitions eligible for `job`, ignoring reservation overlap
/// (applied separately by `filter_reservation_overlap`).
pub fn candidates<'a>(
    job: &Job,
    partitions: &'a BTreeMap<String, &'a Partition>,
    reservations: &indexmap::IndexMap<String, Reservation>,
) -> Vec<&'a Partition> {
    let is_reservation_job = job.queue.starts_with("R.");
    let reservation_name = job.queue.strip_prefix("R.");

    partitions
        .values()
        .copied()
        .filter(|p| p.functional && p.scheduled)
        .filter(|p| p.size >= job.nodes)
        .filter(|p| p.size == 32 || job.nodes > p.size / 2)
        .filter(|p| {
            if is_reservation_job {
                let Some(name) = reservation_name else { return false };
                let Some(reservation) = reservations.get(name) else { return false };
                reservation.partitions.iter().any(|named| named == &p.name || p.all_relatives().any(|r| r == named))
            } else {
                p.queue.iter().any(|q| q == &job.queue)
            }
        })
        .collect()
}

/// Drops a candidate partition if any
/// reservation's window overlaps the job's prospective run and the job
/// isn't entitled to use it (either via the matching `R.<name>` queue or
/// reservation membership).
pub fn filter_reservation_overlap<'a>(
    job: &Job,
    candidates: Vec<&'a Partition>,
    reservations: &indexmap::IndexMap<String, Reservation>,
    now: i64,
) -> Vec<&'a Partition> {
    let span = 60 * job.effective_walltime(false) as i64;
    candidates
        .into_iter()
        .filter(|p| {
            !reservations.values().any(|r| {
                let touches = r.partitions.iter().any(|name| name == &p.name || p.all_relatives().any(|rel| rel == name));
                if !touches || !r.overlaps(now, span) {
                    return false;
                }
                let entitled = job.queue == r.queue_name() || r.users.iter().any(|u| u == &job.user);
                !entitled
            })
        })
        .collect()
}

/// Earliest time `p` and all its relatives are free, from each currently
/// running job's predicted end time.
pub fn backfill_time(partition: &Partition, end_times: &BTreeMap<String, i64>, now: i64) -> i64 {
    let mut latest = now;
    if let Some(end) = end_times.get(&partition.name) {
        latest = latest.max(*end);
    }
    for relative in partition.all_relatives() {
        if let Some(end) = end_times.get(relative) {
            latest = latest.max(*end);
        }
    }
    latest
}

/// A job may backfill onto `p` iff its walltime fits before `p`'s drain
/// window closes, and the window itself isn't longer than `max_drain_hours`
/// (prevents draining a partition across a weekend for one small job).
pub fn can_backfill(job: &Job, partition: &Partition, end_times: &BTreeMap<String, i64>, now: i64, max_drain_hours: u32) -> bool {
    let ready_at = backfill_time(partition, end_times, now);
    let drain_window_hours = (ready_at - now).max(0) as u32 / 3600;
    if drain_window_hours > max_drain_hours {
        return false;
    }
    60 * job.effective_walltime(false) as i64 <= ready_at - now
}

/// After choosing `chosen` for a job, remove it and all its
/// ancestors/descendants from every other job's potential-partition list, so
/// a later job in the same cycle can't double-book hardware.
pub fn tidy_placements(potential: &mut BTreeMap<i64, Vec<String>>, chosen: &Partition) {
    let mut excluded: BTreeSet<&String> = chosen.all_relatives().collect();
    excluded.insert(&chosen.name);
    for list in potential.values_mut() {
        list.retain(|name| !excluded.contains(name));
    }
}

/// Partitions active queues into classes that
/// share physical hardware (directly, or via a wiring conflict), so the
/// scheduler only computes `end_times` across jobs that could plausibly
/// conflict.
pub fn find_queue_equivalence_classes(queues: &[&Queue], partitions: &BTreeMap<String, &Partition>) -> Vec<BTreeSet<String>> {
    let mut classes: Vec<BTreeSet<String>> = Vec::new();

    for queue in queues {
        let touched: BTreeSet<&String> = partitions
            .values()
            .filter(|p| p.queue.iter().any(|q| q == &queue.name))
            .flat_map(|p| std::iter::once(&p.name).chain(p.all_relatives()).chain(p.wiring_conflicts.iter()))
            .collect();

        let mut merged = BTreeSet::new();
        merged.insert(queue.name.clone());
        let mut remaining = Vec::new();
        for class in classes {
            let shares_hardware = class.iter().any(|q| {
                partitions
                    .values()
                    .filter(|p| p.queue.iter().any(|pq| pq == q))
                    .any(|p| touched.contains(&p.name) || p.wiring_conflicts.iter().any(|w| touched.contains(w)))
            });
            if shares_hardware {
                merged.extend(class);
            } else {
                remaining.push(class);
            }
        }
        remaining.push(merged);
        classes = remaining;
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{JobState, Mode, PartitionState};
    use std::collections::BTreeSet;

    fn job(jobid: i64, nodes: u32, queue: &str, state: JobState) -> Job {
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

    fn partition(name: &str, size: u32, queue: &str) -> Partition {
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

    #[test]
    fn minimum_waste_rule_excludes_half_empty_partition() {
        let j = job(1, 17, "default", JobState::Queued);
        let p32 = partition("p32", 32, "default");
        let p64 = partition("p64", 64, "default");
        let map: BTreeMap<String, &Partition> = [("p32".to_string(), &p32), ("p64".to_string(), &p64)].into_iter().collect();
        let reservations = indexmap::IndexMap::new();
        let found = candidates(&j, &map, &reservations);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "p32");
    }

    #[test]
    fn tidy_removes_chosen_and_relatives() {
        let mut chosen = partition("parent", 64, "default");
        chosen.children.insert("child".into());
        let mut potential = BTreeMap::new();
        potential.insert(2, vec!["parent".to_string(), "child".to_string(), "other".to_string()]);

        tidy_placements(&mut potential, &chosen);

        assert_eq!(potential[&2], vec!["other".to_string()]);
    }
}
