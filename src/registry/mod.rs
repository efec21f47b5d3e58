// src/registry/mod.rs

//! The Component Registry (REG): maps logical component names to network
//! endpoints with heartbeat-based liveness.
//!
//! Grounded on `Cobalt.Proxy.register_component`'s periodic re-registration
//! pattern. Stale entries expire after `liveness_timeout_secs`; see
//! DESIGN.md for that decision.

pub mod state;

pub use state::RegistryState;

use crate::core::errors::CobaltError;
use crate::core::state::Runtime;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Builds the method table and automatic tasks for a Registry runtime.
pub async fn build_runtime(runtime: &mut Runtime<RegistryState>, liveness_timeout: Duration) {
    let state = runtime.state.clone();
    runtime.methods.register("register_component", true, move |params: Value| {
        let state = state.clone();
        async move {
            let (name, endpoint): (String, String) = serde_json::from_value(params)?;
            state.lock().await.register(name, endpoint);
            Ok(Value::Null)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("locate", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (name,): (String,) = serde_json::from_value(params)?;
            let endpoint = state
                .lock()
                .await
                .locate(&name)
                .ok_or_else(|| CobaltError::validation(format!("component '{name}' not registered")))?;
            Ok(Value::String(endpoint))
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_components", false, move |_params: Value| {
        let state = state.clone();
        async move {
            let snapshot = state.lock().await.snapshot();
            Ok(serde_json::to_value(snapshot)?)
        }
    });

    let state = runtime.state.clone();
    runtime.tasks.register("expire_stale_components", Duration::from_secs(30), move || {
        let state = state.clone();
        async move {
            state.lock().await.expire_stale(liveness_timeout);
            Ok(())
        }
    }).await;
}
