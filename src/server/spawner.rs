// src/server/spawner.rs

//! Spawns a role's background loops: the automatic-task ticker and,
//! optionally, the metrics server. The RPC listener itself is served from
//! `server::run` since `axum::serve` already owns the accept loop.

use super::metrics_server;
use crate::config::CommonConfig;
use crate::core::rpc_client::ComponentClient;
use crate::core::state::Runtime;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Ticks `runtime.tasks.run_due()` roughly once a second, interleaving RPC
/// serving with the role's automatic periodic methods.
pub fn spawn_task_ticker<S: Send + Sync + 'static>(background: &mut JoinSet<()>, runtime: Arc<Runtime<S>>, mut shutdown_rx: broadcast::Receiver<()>) {
    background.spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => runtime.tasks.run_due().await,
                _ = shutdown_rx.recv() => break,
            }
        }
    });
}

/// Periodically re-registers this role's endpoint with the Registry.
/// Run at a third of the Registry's liveness timeout so a single missed
/// heartbeat never expires the entry.
pub fn spawn_self_registration(
    background: &mut JoinSet<()>,
    registry: Arc<ComponentClient>,
    component_name: &'static str,
    own_endpoint: String,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    background.spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(40));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = registry.call::<_, ()>("register_component", (component_name, own_endpoint.as_str())).await {
                        warn!(component = component_name, error = %e, "failed to register with the component registry");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });
}

/// Spawns the Prometheus `/metrics` server, unless disabled in config.
pub fn spawn_metrics_server(background: &mut JoinSet<()>, common: &CommonConfig, shutdown_rx: broadcast::Receiver<()>) {
    if !common.metrics.enabled {
        info!("Prometheus metrics server is disabled in the configuration.");
        return;
    }
    let port = common.metrics.port;
    background.spawn(async move {
        metrics_server::run_metrics_server(port, shutdown_rx).await;
    });
}
