// src/core/metrics.rs

//! Prometheus metrics exposed by every role's `/metrics` endpoint.
//!
//! Registered once, globally, at first access; built on `once_cell` rather
//! than `lazy_static` since that's already the pattern used elsewhere for
//! process-wide singletons.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, HistogramVec, TextEncoder, register_counter_vec, register_histogram_vec};

pub static RPC_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cobalt_rpc_requests_total",
        "Total RPC requests dispatched, labeled by method and outcome.",
        &["method", "outcome"]
    )
    .unwrap()
});

pub static RPC_LATENCY_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "cobalt_rpc_latency_seconds",
        "RPC method latency in seconds.",
        &["method"]
    )
    .unwrap()
});

pub static TASK_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cobalt_automatic_task_failures_total",
        "Total automatic periodic task invocations that returned an error.",
        &["task"]
    )
    .unwrap()
});

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
