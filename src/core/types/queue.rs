// src/core/types/queue.rs

//! Queue entity. Reservation queues (`R.<name>`) are ordinary
//! `Queue` rows whose lifecycle is driven by the scheduler's reservation
//! subsystem rather than by direct admin calls.

use crate::core::spec::{Matchable, Spec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Running,
    Stopped,
    Draining,
    Dead,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mintime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxuserjobs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxqueued: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxrunning: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxusernodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totalnodes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub state: QueueState,
    /// Name of the placement policy to invoke (`default`, `high-prio`,
    /// `scavenger`, or a custom one).
    pub policy: String,
    #[serde(default)]
    pub limits: QueueLimits,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adminemail: Option<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

impl Queue {
    pub fn is_reservation_queue(&self) -> bool {
        self.name.starts_with("R.")
    }

    pub fn reservation_queue_name(reservation_name: &str) -> String {
        format!("R.{reservation_name}")
    }

    /// `running` for regular queues; for reservation queues, activity
    /// instead tracks the reservation's window and is decided by the
    /// caller (scheduler), not by `state` alone.
    pub fn is_regularly_active(&self) -> bool {
        self.state == QueueState::Running
    }
}

impl Matchable for Queue {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::String(self.name.clone())),
            "state" => serde_json::to_value(self.state).ok(),
            "policy" => Some(Value::String(self.policy.clone())),
            "priority" => Some(Value::from(self.priority)),
            _ => None,
        }
    }

    fn apply_update(&mut self, update: &Spec) {
        if let Some(raw_state) = update.get("state") {
            if let Ok(state) = serde_json::from_value::<QueueState>(raw_state.clone()) {
                self.state = state;
            }
        }
        if let Some(Value::String(policy)) = update.get("policy") {
            self.policy = policy.clone();
        }
        if let Some(v) = update.get("priority").and_then(Value::as_i64) {
            self.priority = v;
        }
        if let Some(Value::Array(users)) = update.get("users") {
            self.users = users
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }
    }
}
