// src/system_manager/diagnostics.rs

//! Partition diagnostics lifecycle, grounded on the pending/failed
//! diagnostics bits tracked per-partition on the original's `BasePartition`.
//!
//! Diagnostics gate a partition's return to service when the role is
//! configured with `diagnostics_required`: a partition taken offline for
//! hardware reasons re-enters the pool as `blocked by pending diags` rather
//! than `idle`, and only becomes schedulable once diagnostics are recorded
//! as passed.

use crate::core::errors::CobaltError;
use crate::core::types::{Partition, PartitionState};

/// Marks `p` as awaiting diagnostics, used when a partition is returned to
/// service after a hardware-offline or failed-diags condition clears.
pub fn queue_for_diagnostics(p: &mut Partition) {
    p.state = PartitionState::BlockedByPendingDiags;
}

/// Records a diagnostics result. Passing clears the block; failing moves the
/// partition to `failed diags`, which keeps it out of the schedulable pool
/// until an operator intervenes (`set_partitions` with `functional=false`
/// then back to `true` re-queues it).
pub fn record_result(p: &mut Partition, passed: bool) -> Result<(), CobaltError> {
    if !matches!(p.state, PartitionState::BlockedByPendingDiags) {
        return Err(CobaltError::validation(format!(
            "partition '{}' is not awaiting diagnostics",
            p.name
        )));
    }
    p.state = if passed { PartitionState::Idle } else { PartitionState::FailedDiags };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn partition() -> Partition {
        Partition {
            name: "p0".into(),
            size: 32,
            queue: vec!["default".into()],
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
    fn failed_diagnostics_keeps_partition_blocked() {
        let mut p = partition();
        queue_for_diagnostics(&mut p);
        record_result(&mut p, false).unwrap();
        assert_eq!(p.state, PartitionState::FailedDiags);
    }

    #[test]
    fn passed_diagnostics_returns_to_idle() {
        let mut p = partition();
        queue_for_diagnostics(&mut p);
        record_result(&mut p, true).unwrap();
        assert_eq!(p.state, PartitionState::Idle);
    }

    #[test]
    fn result_without_pending_request_is_rejected() {
        let mut p = partition();
        assert!(record_result(&mut p, true).is_err());
    }
}
