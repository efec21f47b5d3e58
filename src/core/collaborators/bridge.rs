// src/core/collaborators/bridge.rs

//! The vendor control-system bridge interface: hardware inventory and
//! partition control, normally backed by `libbglbridge`. Out of scope to
//! implement; in scope to interface, so the System Manager's
//! partition-state-update task can be written against a real contract.

use crate::core::errors::CobaltError;
use crate::core::rpc_client::ComponentClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlSystemState {
    Free,
    Configuring,
    Ready,
    Deallocating,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgePartitionStatus {
    pub partition_id: String,
    pub state: ControlSystemState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeNodeCardStatus {
    pub id: String,
    pub offline: bool,
}

/// The bridge's exposed surface, as consumed by the partition-state-update
/// task.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn list_partitions(&self) -> Result<Vec<BridgePartitionStatus>, CobaltError>;
    async fn list_node_cards(&self) -> Result<Vec<BridgeNodeCardStatus>, CobaltError>;
    /// Idempotent: an `IncompatibleState` fault from an already-FREE
    /// partition is swallowed by the caller, not by the bridge itself.
    async fn destroy(&self, partition_id: &str) -> Result<(), CobaltError>;
    async fn set_boot_image(&self, partition_id: &str, kernel: &str) -> Result<(), CobaltError>;
}

pub struct RpcBridge {
    client: ComponentClient,
}

impl RpcBridge {
    pub fn new(client: ComponentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Bridge for RpcBridge {
    async fn list_partitions(&self) -> Result<Vec<BridgePartitionStatus>, CobaltError> {
        self.client.call("list_partitions", ()).await
    }

    async fn list_node_cards(&self) -> Result<Vec<BridgeNodeCardStatus>, CobaltError> {
        self.client.call("list_node_cards", ()).await
    }

    async fn destroy(&self, partition_id: &str) -> Result<(), CobaltError> {
        self.client.call("destroy", (partition_id,)).await
    }

    async fn set_boot_image(&self, partition_id: &str, kernel: &str) -> Result<(), CobaltError> {
        self.client.call("set_boot_image", (partition_id, kernel)).await
    }
}
