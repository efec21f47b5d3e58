// src/server/rpc.rs

//! The JSON-RPC-over-HTTP endpoint shared by every role. HTTP basic auth
//! carries the shared secret. One POST route dispatches into the role's
//! `MethodTable`.

use crate::core::errors::CobaltError;
use crate::core::metrics::{RPC_LATENCY_SECONDS, RPC_REQUESTS_TOTAL};
use crate::core::protocol::{RpcResponse, SharedSecret};
use crate::core::state::Runtime;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Deserialize)]
struct RpcRequest {
    method: String,
    #[serde(default)]
    params: Value,
}

pub struct RpcState<S> {
    pub runtime: Arc<Runtime<S>>,
    pub auth: Option<SharedSecret>,
}

pub fn router<S: Send + Sync + 'static>(state: Arc<RpcState<S>>) -> Router {
    Router::new().route("/", post(dispatch::<S>)).with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

async fn dispatch<S: Send + Sync + 'static>(
    State(state): State<Arc<RpcState<S>>>,
    headers: HeaderMap,
    Json(request): Json<RpcRequest>,
) -> impl IntoResponse {
    if let Some(secret) = &state.auth {
        let verified = bearer_token(&headers).map(|token| secret.verify(token)).unwrap_or(Err(CobaltError::AuthRequired));
        if let Err(e) = verified {
            return (StatusCode::OK, Json(RpcResponse::from_result(Err(e))));
        }
    }

    let start = Instant::now();
    let result = state.runtime.methods.dispatch(&request.method, request.params).await;
    RPC_LATENCY_SECONDS.with_label_values(&[&request.method]).observe(start.elapsed().as_secs_f64());
    RPC_REQUESTS_TOTAL.with_label_values(&[&request.method, if result.is_ok() { "ok" } else { "fault" }]).inc();

    (StatusCode::OK, Json(RpcResponse::from_result(result)))
}
