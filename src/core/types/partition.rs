// src/core/types/partition.rs

//! Partition entity, containment/wiring relations, and the partition state
//! machine.
//!
//! Parent/child/wiring relations are stored as name sets rather than
//! pointers: this makes the scheduler's lock-held snapshot-and-release
//! pattern a cheap clone instead of a graph walk.

use crate::core::spec::{Matchable, Spec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// The partition state machine. Several variants carry
/// the blocking cause, matching the original's parenthesized wire strings
/// (`"blocked (X)"`, `"hardware offline: nodecard N"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionState {
    Idle,
    Allocated,
    Busy,
    Cleanup,
    /// A related partition is non-idle.
    Blocked { by: String },
    /// An equal-sized partition shares switches with this one.
    BlockedWiring { by: String },
    BlockedByPendingDiags,
    BlockedByFailedDiags,
    FailedDiags,
    HardwareOfflineNodeCard { id: String },
    HardwareOfflineSwitch { id: String },
}

impl PartitionState {
    /// The exact wire string the original CLIs expect to see, preserved
    /// verbatim.
    pub fn wire_string(&self) -> String {
        match self {
            PartitionState::Idle => "idle".to_string(),
            PartitionState::Allocated => "allocated".to_string(),
            PartitionState::Busy => "busy".to_string(),
            PartitionState::Cleanup => "cleanup".to_string(),
            PartitionState::Blocked { by } => format!("blocked ({by})"),
            PartitionState::BlockedWiring { by } => format!("blocked-wiring ({by})"),
            PartitionState::BlockedByPendingDiags => "blocked by pending diags".to_string(),
            PartitionState::BlockedByFailedDiags => "blocked by failed diags".to_string(),
            PartitionState::FailedDiags => "failed diags".to_string(),
            PartitionState::HardwareOfflineNodeCard { id } => {
                format!("hardware offline: nodecard {id}")
            }
            PartitionState::HardwareOfflineSwitch { id } => {
                format!("hardware offline: switch {id}")
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PartitionState::Idle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
    /// Node count; a power of two down to 32.
    pub size: u32,
    /// Colon-list of eligible queue names.
    #[serde(default)]
    pub queue: Vec<String>,
    pub scheduled: bool,
    pub functional: bool,
    pub state: PartitionState,
    pub node_cards: Vec<String>,
    #[serde(default)]
    pub switches: Vec<String>,

    // Derived relations; recomputed on every topology change, never
    // persisted independently of `node_cards`/`switches`.
    #[serde(default)]
    pub parents: BTreeSet<String>,
    #[serde(default)]
    pub children: BTreeSet<String>,
    #[serde(default)]
    pub all_children: BTreeSet<String>,
    #[serde(default)]
    pub wiring_conflicts: BTreeSet<String>,

    // Transient reservation fields, owned exclusively by the System
    // Manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_by: Option<i64>,
    #[serde(default)]
    pub cleanup_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfill_time: Option<i64>,
    #[serde(default)]
    pub draining: bool,
}

impl Partition {
    /// Schedulable only if functional+scheduled and every relative is
    /// functional too (relatives must be resolved by the caller, since
    /// `Partition` only stores names).
    pub fn is_locally_schedulable(&self) -> bool {
        self.functional && self.scheduled
    }

    /// Every partition this one contains or is contained by.
    pub fn all_relatives(&self) -> impl Iterator<Item = &String> {
        self.parents.iter().chain(self.children.iter())
    }
}

impl Matchable for Partition {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::String(self.name.clone())),
            "size" => Some(Value::from(self.size)),
            "scheduled" => Some(Value::from(self.scheduled)),
            "functional" => Some(Value::from(self.functional)),
            "state" => Some(Value::String(self.state.wire_string())),
            "used_by" => self.used_by.map(Value::from),
            _ => None,
        }
    }

    fn apply_update(&mut self, update: &Spec) {
        if let Some(v) = update.get("scheduled").and_then(Value::as_bool) {
            self.scheduled = v;
        }
        if let Some(v) = update.get("functional").and_then(Value::as_bool) {
            self.functional = v;
        }
        if let Some(Value::Array(queues)) = update.get("queue") {
            self.queue = queues
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }
    }
}
