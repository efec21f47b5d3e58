// src/core/protocol/dispatch.rs

//! The exposed-method registry and request dispatcher.
//!
//! Grounded on `Component._dispatch`'s approach: each exposed method is
//! looked up by name, invoked with the request's parameters, and timed. The
//! original marks some methods `locking=False` to let them run without
//! taking the component mutex (used for cheap read-only queries under
//! contention); we keep that as an explicit flag on registration rather
//! than a decorator, replacing attribute-marking with an explicit table.

use crate::core::errors::CobaltError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// One exposed RPC method. Implementors receive the raw JSON params array
/// and return the raw JSON result; component handlers typically deserialize
/// `params` into a concrete request type immediately.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(&self, params: Value) -> Result<Value, CobaltError>;
}

#[async_trait]
impl<F, Fut> MethodHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, CobaltError>> + Send,
{
    async fn call(&self, params: Value) -> Result<Value, CobaltError> {
        (self)(params).await
    }
}

struct RegisteredMethod {
    handler: Arc<dyn MethodHandler>,
    /// Whether dispatch must hold the component's state mutex for the
    /// duration of the call. Methods that only read immutable snapshots may
    /// opt out.
    locking: bool,
}

/// The table of exposed methods for one component, built once at startup.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, RegisteredMethod>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self { methods: HashMap::new() }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        locking: bool,
        handler: impl MethodHandler + 'static,
    ) -> &mut Self {
        self.methods.insert(
            name.into(),
            RegisteredMethod { handler: Arc::new(handler), locking },
        );
        self
    }

    pub fn is_locking(&self, name: &str) -> Option<bool> {
        self.methods.get(name).map(|m| m.locking)
    }

    /// Looks up and invokes `name` with `params`, logging elapsed time the
    /// way the original's `Statistics.add_value` tracked per-method timing.
    pub async fn dispatch(&self, name: &str, params: Value) -> Result<Value, CobaltError> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| CobaltError::UnknownMethod(name.to_string()))?;
        let start = Instant::now();
        let result = method.handler.call(params).await;
        debug!(method = name, elapsed_ms = start.elapsed().as_millis() as u64, ok = result.is_ok(), "dispatched rpc method");
        result
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }
}
