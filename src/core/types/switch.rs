// src/core/types/switch.rs

//! Switches, used only to derive wiring conflicts between equal-sized
//! partitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    Idle,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    pub state: SwitchState,
}
