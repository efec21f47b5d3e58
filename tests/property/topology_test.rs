// tests/property/topology_test.rs

//! Containment and wiring-conflict derivation must stay internally
//! consistent no matter which node-card/switch sets two partitions are
//! given.

use cobalt::core::types::{Partition, PartitionState};
use cobalt::system_manager::topology::update_relatives;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn partition(name: &str, size: u32, node_cards: &[String], switches: &[String]) -> Partition {
    Partition {
        name: name.to_string(),
        size,
        queue: vec!["default".to_string()],
        scheduled: true,
        functional: true,
        state: PartitionState::Idle,
        node_cards: node_cards.to_vec(),
        switches: switches.to_vec(),
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

fn node_card_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("n{i}")).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// A strictly smaller node-card set is always the parent's child, and
    /// the relation is never symmetric the other way.
    #[test]
    fn strict_subset_node_cards_always_yields_a_parent_child_pair(
        extra_in_parent in 1usize..6,
        shared in 1usize..6,
    ) {
        let all = node_card_names(shared + extra_in_parent);
        let child_cards: Vec<String> = all[..shared].to_vec();

        let mut partitions = indexmap::IndexMap::new();
        partitions.insert("big".to_string(), partition("big", (shared + extra_in_parent) as u32 * 32, &all, &[]));
        partitions.insert("small".to_string(), partition("small", shared as u32 * 32, &child_cards, &[]));

        update_relatives(&mut partitions);

        prop_assert!(partitions["big"].children.contains("small"));
        prop_assert!(partitions["small"].parents.contains("big"));
        prop_assert!(!partitions["small"].children.contains("big"));
        prop_assert!(!partitions["big"].parents.contains("small"));
    }

    /// Wiring conflicts are always symmetric: if a conflicts with b, b
    /// conflicts with a.
    #[test]
    fn wiring_conflicts_are_symmetric(
        size in 16u32..128,
        shares_switch in any::<bool>(),
    ) {
        let switches_a = vec!["sw0".to_string()];
        let switches_b = if shares_switch { vec!["sw0".to_string()] } else { vec!["sw1".to_string()] };

        let mut partitions = indexmap::IndexMap::new();
        partitions.insert("a".to_string(), partition("a", size, &["na".to_string()], &switches_a));
        partitions.insert("b".to_string(), partition("b", size, &["nb".to_string()], &switches_b));

        update_relatives(&mut partitions);

        prop_assert_eq!(partitions["a"].wiring_conflicts.contains("b"), partitions["b"].wiring_conflicts.contains("a"));
        prop_assert_eq!(partitions["a"].wiring_conflicts.contains("b"), shares_switch);
    }
}
