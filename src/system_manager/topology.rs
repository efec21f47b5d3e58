// src/system_manager/topology.rs

//! Partition containment and wiring-conflict derivation.
//!
//! Relations are recomputed from scratch on every topology change (partition
//! add/del) rather than maintained incrementally, matching the original's
//! `update_relatives` approach: cheap enough given topology changes are rare
//! administrative actions, and far simpler to get right than incremental
//! maintenance.

use crate::core::types::Partition;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Recomputes `parents`, `children`, `all_children`, and `wiring_conflicts`
/// for every partition in `partitions`, in place.
///
/// - `p` is a parent of `q` iff `nc(q)` is a strict subset of `nc(p)`.
/// - `all_children` is the transitive closure of `children`.
/// - Two partitions of equal size that share at least one switch conflict
///   with each other.
pub fn update_relatives(partitions: &mut IndexMap<String, Partition>) {
    let names: Vec<String> = partitions.keys().cloned().collect();
    let node_cards: IndexMap<String, BTreeSet<String>> = partitions
        .iter()
        .map(|(name, p)| (name.clone(), p.node_cards.iter().cloned().collect()))
        .collect();
    let switches: IndexMap<String, BTreeSet<String>> = partitions
        .iter()
        .map(|(name, p)| (name.clone(), p.switches.iter().cloned().collect()))
        .collect();
    let sizes: IndexMap<String, u32> = partitions.iter().map(|(name, p)| (name.clone(), p.size)).collect();

    let mut parents: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    let mut children: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    let mut wiring: IndexMap<String, BTreeSet<String>> = IndexMap::new();

    for name in &names {
        parents.insert(name.clone(), BTreeSet::new());
        children.insert(name.clone(), BTreeSet::new());
        wiring.insert(name.clone(), BTreeSet::new());
    }

    for a in &names {
        for b in &names {
            if a == b {
                continue;
            }
            let nc_a = &node_cards[a];
            let nc_b = &node_cards[b];

            if nc_a.is_subset(nc_b) && nc_a.len() < nc_b.len() {
                // a is strictly contained in b: b is a's parent, a is b's child.
                parents.get_mut(a).unwrap().insert(b.clone());
                children.get_mut(b).unwrap().insert(a.clone());
            }

            if sizes[a] == sizes[b] {
                let sw_a = &switches[a];
                let sw_b = &switches[b];
                if !sw_a.is_empty() && sw_a.intersection(sw_b).next().is_some() {
                    wiring.get_mut(a).unwrap().insert(b.clone());
                }
            }
        }
    }

    // The pairwise subset check already yields every descendant, not just
    // immediate children, so `all_children` mirrors `children` here.
    for name in &names {
        if let Some(p) = partitions.get_mut(name) {
            p.parents = parents.remove(name).unwrap_or_default();
            let own_children = children.remove(name).unwrap_or_default();
            p.all_children = own_children.clone();
            p.children = own_children;
            p.wiring_conflicts = wiring.remove(name).unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PartitionState;

    fn partition(name: &str, size: u32, node_cards: &[&str], switches: &[&str]) -> Partition {
        Partition {
            name: name.to_string(),
            size,
            queue: vec!["default".to_string()],
            scheduled: true,
            functional: true,
            state: PartitionState::Idle,
            node_cards: node_cards.iter().map(|s| s.to_string()).collect(),
            switches: switches.iter().map(|s| s.to_string()).collect(),
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
    fn containment_derives_parent_child() {
        let mut partitions = IndexMap::new();
        partitions.insert("big".into(), partition("big", 128, &["n0", "n1", "n2", "n3"], &[]));
        partitions.insert("small".into(), partition("small", 32, &["n0"], &[]));

        update_relatives(&mut partitions);

        assert!(partitions["small"].parents.contains("big"));
        assert!(partitions["big"].children.contains("small"));
        assert!(partitions["big"].all_children.contains("small"));
    }

    #[test]
    fn equal_sized_shared_switch_is_wiring_conflict() {
        let mut partitions = IndexMap::new();
        partitions.insert("a".into(), partition("a", 32, &["n0"], &["sw0"]));
        partitions.insert("b".into(), partition("b", 32, &["n1"], &["sw0"]));

        update_relatives(&mut partitions);

        assert!(partitions["a"].wiring_conflicts.contains("b"));
        assert!(partitions["b"].wiring_conflicts.contains("a"));
    }
}
