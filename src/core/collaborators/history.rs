// src/core/collaborators/history.rs

//! The historical-message accounting sink. The original's `cdbwriter.py`
//! consumes a queue of job/partition lifecycle events and writes them to a
//! database; that writer is out of scope here, but QM and SM still emit the
//! same breadcrumbs through this trait so a real deployment can plug one in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryMessage {
    JobSubmitted { jobid: i64, user: String, queue: String },
    JobStateChanged { jobid: i64, from: String, to: String },
    JobEnded { jobid: i64, exit_status: i64 },
    PartitionStateChanged { partition: String, from: String, to: String },
}

#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, message: HistoryMessage);
}

/// Drops every message; the default when no history component is
/// registered.
pub struct NullHistorySink;

#[async_trait]
impl HistorySink for NullHistorySink {
    async fn record(&self, _message: HistoryMessage) {}
}

/// Forwards messages to a registered `"history-database"` component,
/// swallowing failures — a best-effort log sink, never allowed to block or
/// fail core scheduling.
pub struct RpcHistorySink {
    client: crate::core::rpc_client::ComponentClient,
}

impl RpcHistorySink {
    pub fn new(client: crate::core::rpc_client::ComponentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HistorySink for RpcHistorySink {
    async fn record(&self, message: HistoryMessage) {
        if let Err(e) = self.client.call::<_, ()>("record", &message).await {
            debug!(error = %e, "best-effort history sink call failed, dropping message");
        }
    }
}
