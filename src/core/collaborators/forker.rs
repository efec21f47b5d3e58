// src/core/collaborators/forker.rs

//! The forker interface: an external process supervisor invoked over RPC.
//! Multiple forker identities (mpirun vs user-script launchers) are distinct
//! endpoints behind this same trait, selected by job `mode`.

use crate::core::errors::CobaltError;
use crate::core::rpc_client::ComponentClient;
use crate::core::types::job::Mode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSpec {
    pub jobid: i64,
    pub executable: String,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub cwd: String,
    pub user: String,
    pub umask: u32,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildStatus {
    pub exit_status: Option<i64>,
    pub signum: Option<i32>,
    pub core_dump: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkerChild {
    pub id: i64,
    pub pid: i64,
    pub complete: bool,
    pub exit_status: Option<i64>,
    pub signum: Option<i32>,
    pub core_dump: bool,
}

/// The forker's exposed RPC surface, as observed by the System Manager.
#[async_trait]
pub trait Forker: Send + Sync {
    async fn start(&self, spec: StartSpec) -> Result<i64, CobaltError>;
    async fn signal(&self, pid: i64, name: &str) -> Result<(), CobaltError>;
    async fn get_status(&self, pid: i64) -> Result<Option<ChildStatus>, CobaltError>;
    async fn get_children(&self) -> Result<Vec<ForkerChild>, CobaltError>;
    async fn cleanup_children(&self, ids: Vec<i64>) -> Result<(), CobaltError>;
    async fn active_list(&self) -> Result<Vec<i64>, CobaltError>;
}

/// An RPC-backed forker client, resolved through the Component Registry
/// under the component name for this mode's launcher
/// (`bg_mpirun_forker` or `user_script_forker`).
pub struct RpcForker {
    client: ComponentClient,
}

impl RpcForker {
    pub fn new(client: ComponentClient) -> Self {
        Self { client }
    }

    /// Picks the forker component name for a job mode: `script` mode uses
    /// the user-script forker, everything else the mpirun forker.
    pub fn component_name_for_mode(mode: Mode) -> &'static str {
        match mode {
            Mode::Script => "user_script_forker",
            _ => "bg_mpirun_forker",
        }
    }
}

#[async_trait]
impl Forker for RpcForker {
    async fn start(&self, spec: StartSpec) -> Result<i64, CobaltError> {
        self.client.call("start", spec).await
    }

    async fn signal(&self, pid: i64, name: &str) -> Result<(), CobaltError> {
        self.client.call("signal", (pid, name)).await
    }

    async fn get_status(&self, pid: i64) -> Result<Option<ChildStatus>, CobaltError> {
        self.client.call("get_status", (pid,)).await
    }

    async fn get_children(&self) -> Result<Vec<ForkerChild>, CobaltError> {
        self.client.call("get_children", ()).await
    }

    async fn cleanup_children(&self, ids: Vec<i64>) -> Result<(), CobaltError> {
        self.client.call("cleanup_children", (ids,)).await
    }

    async fn active_list(&self) -> Result<Vec<i64>, CobaltError> {
        self.client.call("active_list", ()).await
    }
}
