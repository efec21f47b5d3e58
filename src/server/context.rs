// src/server/context.rs

//! Everything one role needs to start serving: its wired `Runtime`, bound
//! listener, optional TLS acceptor, and optional request authentication.

use crate::core::protocol::SharedSecret;
use crate::core::state::Runtime;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;

pub struct RoleContext<S> {
    pub runtime: Arc<Runtime<S>>,
    pub listener: TcpListener,
    pub acceptor: Option<TlsAcceptor>,
    pub auth: Option<SharedSecret>,
    pub shutdown_tx: broadcast::Sender<()>,
}
