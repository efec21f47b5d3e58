// src/core/types/node_card.rs

//! The finest-grained resource unit in the partition topology.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCardState {
    Idle,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCard {
    /// rack/midplane/nodecard identifier, e.g. `R00-M0-N00`.
    pub id: String,
    pub state: NodeCardState,
    /// The partition currently holding this node card, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
}
