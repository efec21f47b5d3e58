// src/core/collaborators/mod.rs

//! Interfaces to external collaborators this crate does not implement
//! itself: forkers, the vendor bridge, and the historical accounting sink.
//! Each is a trait plus an RPC-backed client.

pub mod bridge;
pub mod forker;
pub mod history;

pub use bridge::{Bridge, RpcBridge};
pub use forker::{Forker, RpcForker};
pub use history::{HistoryMessage, HistorySink, NullHistorySink, RpcHistorySink};
