// src/core/rpc_client.rs

//! A client for calling another component's exposed methods over the JSON-RPC
//! substrate. Callers cache endpoints and re-resolve on connection failure.
//!
//! Grounded on the original's `Cobalt.Proxy.ComponentProxy`, which wraps an
//! XML-RPC client and transparently re-locates through the registry when a
//! call fails. Here the same shape is built on `reqwest` + the registry's own
//! `locate` RPC.

use crate::core::errors::CobaltError;
use crate::core::protocol::fault::RpcResponse;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves a logical component name to a live HTTP endpoint, with a cached
/// last-known-good value re-resolved only on failure.
#[async_trait::async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self, component: &str) -> Result<String, CobaltError>;
}

/// An `EndpointResolver` backed by a call to the Component Registry's own
/// `locate` method.
pub struct RegistryResolver {
    registry_endpoint: String,
    http: reqwest::Client,
}

impl RegistryResolver {
    pub fn new(registry_endpoint: String, timeout: Duration) -> Self {
        Self {
            registry_endpoint,
            http: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl EndpointResolver for RegistryResolver {
    async fn resolve(&self, component: &str) -> Result<String, CobaltError> {
        let client = RpcClient::direct(self.registry_endpoint.clone(), self.http.clone(), None);
        let endpoint: String = client.call("locate", &[component]).await?;
        Ok(endpoint)
    }
}

/// A cached-endpoint RPC client for calling one named peer component.
///
/// Holds a cached endpoint behind a `RwLock`; `call` retries once after
/// re-resolving through the registry on any transport-level failure, mapping
/// the original's "cache endpoints, re-resolve on connection failure"
/// behavior.
pub struct ComponentClient {
    component: String,
    resolver: Arc<dyn EndpointResolver>,
    http: reqwest::Client,
    cached_endpoint: RwLock<Option<String>>,
    auth_token: Option<String>,
}

impl ComponentClient {
    pub fn new(
        component: impl Into<String>,
        resolver: Arc<dyn EndpointResolver>,
        timeout: Duration,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            component: component.into(),
            resolver,
            http: reqwest::Client::builder().timeout(timeout).build().unwrap_or_default(),
            cached_endpoint: RwLock::new(None),
            auth_token,
        }
    }

    async fn endpoint(&self, force_refresh: bool) -> Result<String, CobaltError> {
        if !force_refresh {
            if let Some(endpoint) = self.cached_endpoint.read().clone() {
                return Ok(endpoint);
            }
        }
        let endpoint = self.resolver.resolve(&self.component).await?;
        *self.cached_endpoint.write() = Some(endpoint.clone());
        Ok(endpoint)
    }

    /// Calls `method` on the peer with `params`, retrying once against a
    /// freshly-resolved endpoint if the first attempt fails to transport.
    pub async fn call<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, CobaltError> {
        let endpoint = self.endpoint(false).await?;
        match RpcClient::direct(endpoint, self.http.clone(), self.auth_token.clone())
            .call(method, params)
            .await
        {
            Ok(value) => Ok(value),
            Err(CobaltError::Transient { .. }) => {
                warn!(component = %self.component, method, "retrying after re-resolving endpoint");
                let endpoint = self.endpoint(true).await?;
                RpcClient::direct(endpoint, self.http.clone(), self.auth_token.clone())
                    .call(method, params)
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

/// A one-shot client bound to a known endpoint (no caching or retry), used
/// both as the building block for `ComponentClient` and directly for talking
/// to the registry itself.
struct RpcClient {
    endpoint: String,
    http: reqwest::Client,
    auth_token: Option<String>,
}

impl RpcClient {
    fn direct(endpoint: String, http: reqwest::Client, auth_token: Option<String>) -> Self {
        Self { endpoint, http, auth_token }
    }

    async fn call<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, CobaltError> {
        let body = serde_json::json!({ "method": method, "params": params });
        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        debug!(endpoint = %self.endpoint, method, "calling peer rpc method");
        let response = request.send().await.map_err(|e| {
            CobaltError::transient(self.endpoint.clone(), format!("rpc transport error: {e}"))
        })?;
        let rpc_response: RpcResponse = response.json().await.map_err(|e| {
            CobaltError::transient(self.endpoint.clone(), format!("rpc decode error: {e}"))
        })?;
        match rpc_response {
            RpcResponse::Ok { result } => {
                serde_json::from_value(result).map_err(CobaltError::from)
            }
            RpcResponse::Fault { fault } => Err(CobaltError::internal(format!(
                "peer fault {}: {}",
                fault.code, fault.message
            ))),
        }
    }
}
