// src/server/initialization.rs

//! Restores a role's persisted state, binds its RPC listener, and loads TLS
//! and shared-secret material from config.

use crate::config::CommonConfig;
use crate::core::persistence::StateStore;
use crate::core::protocol::SharedSecret;
use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::{TlsAcceptor, rustls};
use tracing::info;

/// Restores `component_name`'s persisted state, or `None` on first boot,
/// mirroring the original's `Component.restore_state`. The caller supplies
/// the fresh-start value, since some roles (e.g. the System Manager) need
/// config-derived fields a bare `Default` can't provide.
pub async fn load_state<S: DeserializeOwned>(common: &CommonConfig, component_name: &str) -> Result<(Option<S>, StateStore)> {
    let store = StateStore::new(&common.spool_dir, component_name);
    let state = store.load::<S>().await?;
    Ok((state, store))
}

pub async fn bind_listener(common: &CommonConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind((common.host.as_str(), common.port))
        .await
        .with_context(|| format!("binding to {}:{}", common.host, common.port))?;
    info!(host = %common.host, port = common.port, "bound RPC listener");
    Ok(listener)
}

pub fn load_auth(common: &CommonConfig) -> Result<Option<SharedSecret>> {
    match &common.key_file {
        Some(path) => Ok(Some(SharedSecret::load(path)?)),
        None => Ok(None),
    }
}

/// Sets up the TLS acceptor if TLS is enabled in the configuration.
pub async fn setup_tls(common: &CommonConfig) -> Result<Option<TlsAcceptor>> {
    if !common.tls.enabled {
        return Ok(None);
    }
    info!("TLS is enabled. Loading certificate and key.");
    let certs = load_certs(&common.tls.cert_path)?;
    let key = load_key(&common.tls.key_path)?;
    let server_config = rustls::ServerConfig::builder().with_no_client_auth().with_single_cert(certs, key)?;
    Ok(Some(TlsAcceptor::from(Arc::new(server_config))))
}

/// Loads TLS certificates from a PEM file.
fn load_certs(path: &str) -> Result<Vec<rustls::pki_types::CertificateDer<'static>>> {
    let cert_file = File::open(path).map_err(|e| anyhow!("failed to open certificate file '{path}': {e}"))?;
    let mut cert_reader = BufReader::new(cert_file);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(anyhow!("no certificates found in '{path}'"));
    }
    Ok(certs)
}

/// Loads a private key from a PEM file.
fn load_key(path: &str) -> Result<rustls::pki_types::PrivateKeyDer<'static>> {
    let key_file = File::open(path).map_err(|e| anyhow!("failed to open private key file '{path}': {e}"))?;
    let mut key_reader = BufReader::new(key_file);
    rustls_pemfile::private_key(&mut key_reader)?.ok_or_else(|| anyhow!("no private key found in key file '{path}'"))
}
