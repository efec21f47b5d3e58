// src/registry/state.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

struct Entry {
    endpoint: String,
    last_seen: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub endpoint: String,
}

/// The Registry's owned state: a name -> endpoint map with a last-seen
/// timestamp per entry. Persisted state is just the endpoint table.
#[derive(Default)]
pub struct RegistryState {
    entries: HashMap<String, Entry>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: String, endpoint: String) {
        info!(component = %name, endpoint = %endpoint, "component registered");
        self.entries.insert(name, Entry { endpoint, last_seen: Instant::now() });
    }

    pub fn locate(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|e| e.endpoint.clone())
    }

    pub fn snapshot(&self) -> Vec<ComponentInfo> {
        self.entries
            .iter()
            .map(|(name, e)| ComponentInfo { name: name.clone(), endpoint: e.endpoint.clone() })
            .collect()
    }

    /// Drops any entry whose last registration is older than `timeout`.
    pub fn expire_stale(&mut self, timeout: Duration) {
        let now = Instant::now();
        self.entries.retain(|name, entry| {
            let alive = now.duration_since(entry.last_seen) < timeout;
            if !alive {
                warn!(component = %name, "expiring stale component registration");
            }
            alive
        });
    }
}

/// The persisted form of the registry: endpoints only, since liveness
/// timestamps are runtime-only and reset on restart.
#[derive(Serialize, Deserialize)]
pub struct PersistedRegistry {
    pub endpoints: HashMap<String, String>,
}

impl From<&RegistryState> for PersistedRegistry {
    fn from(state: &RegistryState) -> Self {
        PersistedRegistry {
            endpoints: state.entries.iter().map(|(k, v)| (k.clone(), v.endpoint.clone())).collect(),
        }
    }
}

impl From<PersistedRegistry> for RegistryState {
    fn from(persisted: PersistedRegistry) -> Self {
        let now = Instant::now();
        RegistryState {
            entries: persisted
                .endpoints
                .into_iter()
                .map(|(k, endpoint)| (k, Entry { endpoint, last_seen: now }))
                .collect(),
        }
    }
}
