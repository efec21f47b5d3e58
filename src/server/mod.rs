// src/server/mod.rs

//! Hosts one role's `Runtime` behind a JSON-RPC-over-HTTP listener, plus its
//! automatic-task ticker and optional metrics server.

pub mod context;
pub mod initialization;
pub mod metrics_server;
pub mod rpc;
pub mod spawner;

use crate::config::CommonConfig;
use crate::core::rpc_client::ComponentClient;
use crate::core::state::Runtime;
use anyhow::Result;
use context::RoleContext;
use rpc::RpcState;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

/// Self-registration parameters for the non-Registry roles. `component_name`
/// is the name this role announces itself under; `own_endpoint` is the URL
/// other components should use to reach it.
pub struct Registration {
    pub registry: Arc<ComponentClient>,
    pub component_name: &'static str,
    pub own_endpoint: String,
}

/// Wraps a `TcpListener` + `TlsAcceptor` pair as an `axum::serve::Listener`,
/// so `axum::serve` drives the accept loop for TLS the same way it does for
/// plain TCP. A connection that fails its TLS handshake is dropped and
/// accepting continues rather than tearing down the whole listener.
struct TlsListener {
    inner: tokio::net::TcpListener,
    acceptor: TlsAcceptor,
}

impl axum::serve::Listener for TlsListener {
    type Io = tokio_rustls::server::TlsStream<TcpStream>;
    type Addr = std::net::SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            let (stream, addr) = match self.inner.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "tcp accept failed");
                    continue;
                }
            };
            match self.acceptor.accept(stream).await {
                Ok(tls_stream) => return (tls_stream, addr),
                Err(e) => warn!(error = %e, "tls handshake failed"),
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

/// Restores `component_name`'s state, builds its `RoleContext`, and serves
/// its JSON-RPC listener, automatic tasks, and metrics endpoint until
/// ctrl-c. `runtime` must already have its methods and tasks registered by
/// the caller's role-specific `build_runtime`.
pub async fn run<S: Send + Sync + 'static>(runtime: Runtime<S>, common: &CommonConfig, registration: Option<Registration>) -> Result<()> {
    let listener = initialization::bind_listener(common).await?;
    let acceptor = initialization::setup_tls(common).await?;
    let auth = initialization::load_auth(common)?;
    let (shutdown_tx, _) = broadcast::channel(1);

    let ctx = RoleContext {
        runtime: Arc::new(runtime),
        listener,
        acceptor,
        auth,
        shutdown_tx,
    };

    let mut background: JoinSet<()> = JoinSet::new();
    spawner::spawn_task_ticker(&mut background, ctx.runtime.clone(), ctx.shutdown_tx.subscribe());
    spawner::spawn_metrics_server(&mut background, common, ctx.shutdown_tx.subscribe());
    if let Some(reg) = registration {
        spawner::spawn_self_registration(&mut background, reg.registry, reg.component_name, reg.own_endpoint, ctx.shutdown_tx.subscribe());
    }

    let rpc_state = Arc::new(RpcState { runtime: ctx.runtime.clone(), auth: ctx.auth });
    let app = rpc::router(rpc_state);

    info!("role ready to serve RPC requests");
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown signal received");
    };

    match ctx.acceptor {
        Some(acceptor) => {
            let tls_listener = TlsListener { inner: ctx.listener, acceptor };
            axum::serve(tls_listener, app).with_graceful_shutdown(shutdown).await?;
        }
        None => {
            axum::serve(ctx.listener, app).with_graceful_shutdown(shutdown).await?;
        }
    }

    ctx.shutdown_tx.send(()).ok();
    background.shutdown().await;
    Ok(())
}
