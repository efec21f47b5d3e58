// src/scheduler/foreign_data.rs

//! Generic foreign-data synchronization, following a `ForeignDataDict`
//! mirror-and-replace approach.
//!
//! The scheduler holds read-only mirrors of the Queue Manager's jobs/queues
//! and the System Manager's partitions. Each mirror refreshes on its own
//! periodic tick by calling the owner's `get_*` method with a wildcard spec
//! and replacing the local copy wholesale — since the mirrored types here
//! are complete, self-contained structs (unlike the original's partial
//! field-copy dicts), a full replace has the same end state as "remove
//! locals not in foreign, add foreigns not in local, update the rest" while
//! being considerably simpler to reason about.

use indexmap::IndexMap;
use std::future::Future;
use std::hash::Hash;
use tracing::warn;

/// A periodically refreshed read-only mirror of another component's data.
pub struct ForeignDataDict<K, V> {
    pub items: IndexMap<K, V>,
    /// Set when the last sync attempt failed; the previous good copy is
    /// preserved.
    pub sync_failed: bool,
}

impl<K, V> Default for ForeignDataDict<K, V> {
    fn default() -> Self {
        Self { items: IndexMap::new(), sync_failed: false }
    }
}

impl<K: Eq + Hash + Clone, V> ForeignDataDict<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refreshes the mirror. `fetch` performs the `get_*` RPC call;
    /// `key_of` extracts the primary key from each returned entity.
    pub async fn sync<E, Fut>(&mut self, label: &str, fetch: impl FnOnce() -> Fut, key_of: impl Fn(&V) -> K)
    where
        Fut: Future<Output = Result<Vec<V>, E>>,
        E: std::fmt::Display,
    {
        self.apply(label, fetch().await, key_of);
    }

    /// Same as `sync`, but takes an already-completed fetch result. Lets
    /// callers perform the RPC outside their state lock and only take the
    /// lock to write the result in.
    pub fn apply<E: std::fmt::Display>(&mut self, label: &str, result: Result<Vec<V>, E>, key_of: impl Fn(&V) -> K) {
        match result {
            Ok(list) => {
                self.items = list.into_iter().map(|v| (key_of(&v), v)).collect();
                self.sync_failed = false;
            }
            Err(e) => {
                warn!(dataset = label, error = %e, "foreign data sync failed, keeping last good copy");
                self.sync_failed = true;
            }
        }
    }
}
