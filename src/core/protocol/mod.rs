// src/core/protocol/mod.rs

//! The RPC substrate: exposed-method dispatch, the shared JSON-RPC fault
//! envelope, and request authentication.

pub mod auth;
pub mod dispatch;
pub mod fault;

pub use auth::SharedSecret;
pub use dispatch::{MethodHandler, MethodTable};
pub use fault::{Fault, RpcResponse};
