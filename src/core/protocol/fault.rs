// src/core/protocol/fault.rs

//! The JSON-RPC fault envelope: the idiomatic-Rust substitute for the
//! original's `xmlrpclib.Fault(code, message)`. Fault codes are preserved
//! verbatim.

use crate::core::errors::CobaltError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl From<&CobaltError> for Fault {
    fn from(e: &CobaltError) -> Self {
        Fault {
            code: e.fault_code(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RpcResponse {
    Ok { result: serde_json::Value },
    Fault { fault: Fault },
}

impl RpcResponse {
    pub fn ok(result: serde_json::Value) -> Self {
        RpcResponse::Ok { result }
    }

    pub fn from_result(result: Result<serde_json::Value, CobaltError>) -> Self {
        match result {
            Ok(v) => RpcResponse::ok(v),
            Err(e) => RpcResponse::Fault { fault: Fault::from(&e) },
        }
    }
}
