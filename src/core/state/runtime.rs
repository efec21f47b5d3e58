// src/core/state/runtime.rs

//! The generic per-role runtime: domain state guarded by one mutex, the
//! method table, the automatic-task table, and a handle to the logging
//! filter for dynamic level changes.
//!
//! Every role (`registry`, `queue_manager`, `system_manager`, `scheduler`)
//! is an instance of `Runtime<DomainState>`; the domain-specific state
//! struct and its handlers live in that role's own module.

use crate::core::persistence::StateStore;
use crate::core::protocol::MethodTable;
use crate::core::tasks::AutomaticTaskTable;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{filter::EnvFilter, reload};

pub struct Runtime<S> {
    /// The single mutex guarding this component's owned data.
    /// RPCs and automatic tasks both take this lock for the duration of
    /// their state access, and release it around outbound calls.
    pub state: Arc<Mutex<S>>,
    pub methods: MethodTable,
    pub tasks: AutomaticTaskTable,
    pub store: StateStore,
    pub log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
}

impl<S> Runtime<S> {
    pub fn new(
        state: S,
        store: StateStore,
        log_reload_handle: Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            methods: MethodTable::new(),
            tasks: AutomaticTaskTable::new(),
            store,
            log_reload_handle,
        }
    }
}
