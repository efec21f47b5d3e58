// src/system_manager/state_machine.rs

//! The periodic partition-state-update task, driven by a snapshot of
//! control-system state fetched once per tick outside the lock.

use crate::core::collaborators::bridge::{Bridge, BridgePartitionStatus, ControlSystemState};
use crate::core::types::{Partition, PartitionState};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::SystemManagerState;

/// Snapshot of the control system's view, fetched outside the state lock
/// since blocking I/O happens outside the mutex when possible.
pub struct ControlSystemSnapshot {
    pub partitions: BTreeMap<String, ControlSystemState>,
    pub offline_node_cards: std::collections::BTreeSet<String>,
    pub offline_switches: std::collections::BTreeSet<String>,
}

pub async fn fetch_snapshot(bridge: &Arc<dyn Bridge>) -> ControlSystemSnapshot {
    let partitions = bridge
        .list_partitions()
        .await
        .map(|list| list.into_iter().map(|p: BridgePartitionStatus| (p.partition_id, p.state)).collect())
        .unwrap_or_default();
    let node_cards = bridge.list_node_cards().await.unwrap_or_default();
    let offline_node_cards = node_cards.into_iter().filter(|nc| nc.offline).map(|nc| nc.id).collect();
    ControlSystemSnapshot { partitions, offline_node_cards, offline_switches: Default::default() }
}

/// Partitions that need control-system follow-up after `apply_snapshot`,
/// issued by the caller once the state lock is released.
pub struct PostSnapshotActions {
    pub to_destroy: Vec<String>,
    pub to_reset_kernel: Vec<String>,
}

/// The mutating half of one partition-state-update cycle, applied under the
/// state lock. Returns the follow-up control-system calls the caller must
/// issue after releasing the lock, since blocking I/O happens outside the
/// mutex when possible.
pub fn apply_snapshot(state: &mut SystemManagerState, snapshot: &ControlSystemSnapshot, now: i64) -> PostSnapshotActions {
    let mut to_destroy: Vec<String> = Vec::new();
    let mut to_reset_kernel: Vec<String> = Vec::new();

    let names: Vec<String> = state.partitions.keys().cloned().collect();
    for name in &names {
        let Some(p) = state.partitions.get_mut(name) else { continue };

        if let Some(until) = p.reserved_until {
            if until < now {
                p.reserved_until = None;
            }
        }

        if p.cleanup_pending {
            let still_busy = snapshot.partitions.get(name).map(|s| *s != ControlSystemState::Free).unwrap_or(false);
            if still_busy {
                p.state = PartitionState::Cleanup;
                to_destroy.push(name.clone());
                for child in p.all_children.clone() {
                    to_destroy.push(child);
                }
                continue;
            }

            p.cleanup_pending = false;
            p.used_by = None;
            to_reset_kernel.push(name.clone());
            info!(partition = %name, "cleanup complete, partition returned to idle");
            recompute_derived_state(p, snapshot);
            continue;
        }

        if let Some(cs_state) = snapshot.partitions.get(name) {
            if *cs_state != ControlSystemState::Free {
                p.state = PartitionState::Busy;
                continue;
            }
        }

        recompute_derived_state(p, snapshot);
    }

    apply_relative_blocking(&mut state.partitions);
    PostSnapshotActions { to_destroy, to_reset_kernel }
}

/// Issues the control-system `destroy` calls `apply_snapshot` queued up,
/// with no state lock held. Idempotent: a `Conflict` fault from an
/// already-FREE partition is swallowed.
pub async fn destroy_all(bridge: &Arc<dyn Bridge>, targets: Vec<String>) {
    for name in targets {
        match bridge.destroy(&name).await {
            Ok(()) | Err(crate::core::errors::CobaltError::Conflict(_)) => {}
            Err(e) => warn!(partition = %name, error = %e, "control-system destroy failed"),
        }
    }
}

/// Resets each partition's boot image to `default` once its cleanup has
/// completed, with no state lock held.
pub async fn reset_kernels(bridge: &Arc<dyn Bridge>, targets: Vec<String>) {
    for name in targets {
        if let Err(e) = bridge.set_boot_image(&name, "default").await {
            warn!(partition = %name, error = %e, "boot image reset failed");
        }
    }
}

/// Recomputes `allocated`/hardware-offline priority for a partition that the
/// control system currently reports as FREE. `blocked`/`blocked-wiring` are
/// lower priority and require the
/// full partition table, so they're applied afterwards by
/// `apply_relative_blocking`.
fn recompute_derived_state(p: &mut Partition, snapshot: &ControlSystemSnapshot) {
    if p.reserved_until.is_some() {
        p.state = PartitionState::Allocated;
        return;
    }

    for nc in &p.node_cards {
        if snapshot.offline_node_cards.contains(nc) {
            p.state = PartitionState::HardwareOfflineNodeCard { id: nc.clone() };
            return;
        }
    }
    for sw in &p.switches {
        if snapshot.offline_switches.contains(sw) {
            p.state = PartitionState::HardwareOfflineSwitch { id: sw.clone() };
            return;
        }
    }

    p.state = PartitionState::Idle;
}

/// Separate pass requiring the full partition table, applied after
/// `recompute_derived_state` has handled reservation/hardware priority.
/// `blocked`/`blocked-wiring` come after `allocated` and hardware-offline
/// in priority, before falling back to `idle`.
pub fn apply_relative_blocking(partitions: &mut IndexMap<String, Partition>) {
    let snapshot: IndexMap<String, PartitionState> = partitions.iter().map(|(n, p)| (n.clone(), p.state.clone())).collect();

    for name in partitions.keys().cloned().collect::<Vec<_>>() {
        let is_idle_or_allocated = matches!(
            snapshot.get(&name),
            Some(PartitionState::Idle) | Some(PartitionState::Allocated)
        );
        if !is_idle_or_allocated {
            continue;
        }
        let Some(p) = partitions.get(&name) else { continue };

        if matches!(snapshot.get(&name), Some(PartitionState::Allocated)) {
            continue;
        }

        if let Some(busy_relative) = p
            .parents
            .iter()
            .chain(p.children.iter())
            .find(|r| !matches!(snapshot.get(*r), Some(PartitionState::Idle) | None))
        {
            let by = busy_relative.clone();
            partitions.get_mut(&name).unwrap().state = PartitionState::Blocked { by };
            continue;
        }

        if let Some(conflicted) = p
            .wiring_conflicts
            .iter()
            .find(|r| !matches!(snapshot.get(*r), Some(PartitionState::Idle) | None))
        {
            let by = conflicted.clone();
            partitions.get_mut(&name).unwrap().state = PartitionState::BlockedWiring { by };
        }
    }
}
